//! Domain types for postback commission resolution.
//!
//! This module provides:
//! - Lossless monetary handling via the Decimal wrapper
//! - House and Affiliate directory records
//! - Postback event types with tolerant amount normalization
//! - Commission line items, aggregates, and ledger records

pub mod affiliate;
pub mod commission;
pub mod decimal;
pub mod event;
pub mod house;

pub use affiliate::Affiliate;
pub use commission::{CommissionKind, CommissionLineItem, CommissionRecord, CommissionResult};
pub use decimal::Decimal;
pub use event::{parse_amount, EventType, PostbackEvent};
pub use house::{CommissionType, House};
