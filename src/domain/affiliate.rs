//! Referring affiliate records.

use serde::{Deserialize, Serialize};

/// A referring user credited via the inbound `subid` parameter.
///
/// Identity details (name, email) live in the identity subsystem; the
/// engine only needs the unique username to attribute commissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliate {
    pub username: String,
}

impl Affiliate {
    pub fn new(username: impl Into<String>) -> Self {
        Affiliate {
            username: username.into(),
        }
    }
}

impl std::fmt::Display for Affiliate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}
