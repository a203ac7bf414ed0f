//! Directory lookups for houses and affiliates.
//!
//! The directories are external storage from the engine's point of view:
//! read-only during a request, unique on their identifiers, and responsible
//! for their own timeout enforcement. A timed-out lookup surfaces here as a
//! failed lookup, never as an engine-side wait.

use crate::domain::{Affiliate, House};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryDirectory;

/// Lookup contract consumed by the postback pipeline.
///
/// `Ok(None)` means the entity does not exist; errors are backend faults.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a house by its URL slug.
    async fn find_house_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<House>, DirectoryError>;

    /// Resolve an affiliate by the username carried in `subid`.
    async fn find_affiliate_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Affiliate>, DirectoryError>;
}

/// Error type for directory lookups.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("directory backend error: {0}")]
    Backend(String),
    #[error("directory lookup timed out")]
    Timeout,
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        DirectoryError::Backend(err.to_string())
    }
}
