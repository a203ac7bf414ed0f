pub mod api;
pub mod config;
pub mod db;
pub mod directory;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, Repository};
pub use directory::{Directory, DirectoryError, InMemoryDirectory};
pub use domain::{
    Affiliate, CommissionKind, CommissionLineItem, CommissionResult, CommissionType, Decimal,
    EventType, House, PostbackEvent,
};
pub use error::AppError;
