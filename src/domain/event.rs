//! Inbound postback events.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Player event reported by a partner house.
///
/// The set is extensible on the wire; anything unrecognized maps to
/// `Unknown` and is acknowledged with zero commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Registration,
    FirstDeposit,
    Deposit,
    Profit,
    Unknown,
}

impl EventType {
    /// Decode the raw path segment of a postback URL.
    pub fn parse(s: &str) -> EventType {
        match s.trim().to_lowercase().as_str() {
            "registration" => EventType::Registration,
            "first_deposit" => EventType::FirstDeposit,
            "deposit" => EventType::Deposit,
            "profit" => EventType::Profit,
            _ => EventType::Unknown,
        }
    }

    /// Acquisition events pay flat CPA rates.
    pub fn is_acquisition(&self) -> bool {
        matches!(self, EventType::Registration | EventType::FirstDeposit)
    }

    /// Revenue events pay a share of the reported amount.
    pub fn is_revenue(&self) -> bool {
        matches!(self, EventType::Deposit | EventType::Profit)
    }
}

/// A validated postback, ready for commission evaluation.
///
/// Ephemeral: lives for one request and is only persisted through the
/// commission record it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostbackEvent {
    pub house_identifier: String,
    /// Raw event segment as received, echoed in responses and the ledger.
    pub event_name: String,
    pub event_type: EventType,
    /// Affiliate username from the `subid` parameter.
    pub sub_id: String,
    /// Reported monetary amount, normalized to zero when absent, malformed,
    /// or negative.
    pub amount: Decimal,
    /// Opaque external player reference, audit only.
    pub customer_id: Option<String>,
}

impl PostbackEvent {
    /// Stable idempotency key for this event.
    ///
    /// With a customer reference the key is deterministic, so a retried
    /// delivery collapses onto the same ledger row. The amount participates
    /// so distinct deposits by one customer each credit. Without a customer
    /// reference there is nothing stable to key on and every delivery gets
    /// a fresh key.
    pub fn event_key(&self) -> String {
        let customer = self
            .customer_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let Some(customer) = customer else {
            return format!("uniq:{}", Uuid::new_v4());
        };

        use sha2::{Digest, Sha256};

        fn hash_var(hasher: &mut Sha256, data: &str) {
            hasher.update((data.len() as u32).to_le_bytes());
            hasher.update(data.as_bytes());
        }

        let mut hasher = Sha256::new();
        hash_var(&mut hasher, &self.house_identifier);
        hash_var(&mut hasher, &self.event_name);
        hash_var(&mut hasher, customer);
        hash_var(&mut hasher, &self.amount.to_canonical_string());

        let hash = hasher.finalize();
        format!("evt:{}", hex::encode(&hash[..16]))
    }
}

/// Normalize a raw `amount` query value.
///
/// Postback senders are not trusted to format numbers; anything that does
/// not parse as a non-negative decimal becomes zero instead of failing the
/// request.
pub fn parse_amount(raw: Option<&str>) -> Decimal {
    let parsed = raw
        .and_then(|s| Decimal::parse(s).ok())
        .unwrap_or_else(Decimal::zero);
    if parsed.is_negative() {
        Decimal::zero()
    } else {
        parsed
    }
}
