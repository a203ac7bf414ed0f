//! Commission line items, aggregates, and the durable ledger record.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

/// Which rule produced a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommissionKind {
    #[serde(rename = "CPA")]
    Cpa,
    #[serde(rename = "RevShare")]
    RevShare,
}

impl CommissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionKind::Cpa => "CPA",
            CommissionKind::RevShare => "RevShare",
        }
    }

    /// Decode a stored kind string.
    pub fn parse(s: &str) -> Option<CommissionKind> {
        match s {
            "CPA" => Some(CommissionKind::Cpa),
            "RevShare" => Some(CommissionKind::RevShare),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One component of the commission owed for a single event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionLineItem {
    pub kind: CommissionKind,
    /// Monetary amount attributed to the affiliate.
    pub value: Decimal,
    /// RevShare rate used, kept for audit/display. Absent on CPA items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
}

impl CommissionLineItem {
    /// Flat CPA payout.
    pub fn cpa(rate: Decimal) -> Self {
        CommissionLineItem {
            kind: CommissionKind::Cpa,
            value: rate,
            percentage: None,
        }
    }

    /// Revenue-share payout with the raw percentage recorded.
    pub fn revshare(value: Decimal, percentage: Decimal) -> Self {
        CommissionLineItem {
            kind: CommissionKind::RevShare,
            value,
            percentage: Some(percentage),
        }
    }
}

/// Aggregate commission for one event: the line items plus their exact sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionResult {
    pub items: Vec<CommissionLineItem>,
    pub total: Decimal,
}

impl CommissionResult {
    /// Aggregate line items, summing values without intermediate rounding.
    pub fn from_items(items: Vec<CommissionLineItem>) -> Self {
        let total = items
            .iter()
            .fold(Decimal::zero(), |acc, item| acc + item.value);
        CommissionResult { items, total }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Durable ledger entry handed to persistence after aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionRecord {
    /// Idempotency key; the ledger holds at most one row per key.
    pub event_key: String,
    pub house_identifier: String,
    pub affiliate_username: String,
    /// Raw event segment as received.
    pub event_name: String,
    pub amount: Decimal,
    pub customer_id: Option<String>,
    pub recorded_at_ms: i64,
    pub result: CommissionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::parse(s).unwrap()
    }

    #[test]
    fn test_from_items_sums_values() {
        let result = CommissionResult::from_items(vec![
            CommissionLineItem::cpa(dec("50")),
            CommissionLineItem::revshare(dec("40"), dec("20")),
        ]);
        assert_eq!(result.total, dec("90"));
        assert_eq!(result.items.len(), 2);
    }

    #[test]
    fn test_from_items_empty_is_zero() {
        let result = CommissionResult::from_items(vec![]);
        assert!(result.is_empty());
        assert!(result.total.is_zero());
    }

    #[test]
    fn test_from_items_sum_is_exact() {
        let result = CommissionResult::from_items(vec![
            CommissionLineItem::cpa(dec("0.1")),
            CommissionLineItem::cpa(dec("0.2")),
        ]);
        assert_eq!(result.total, dec("0.3"));
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&CommissionKind::Cpa).unwrap(),
            "\"CPA\""
        );
        assert_eq!(
            serde_json::to_string(&CommissionKind::RevShare).unwrap(),
            "\"RevShare\""
        );
    }

    #[test]
    fn test_kind_parse_roundtrip() {
        assert_eq!(CommissionKind::parse("CPA"), Some(CommissionKind::Cpa));
        assert_eq!(
            CommissionKind::parse("RevShare"),
            Some(CommissionKind::RevShare)
        );
        assert_eq!(CommissionKind::parse("cpa"), None);
    }

    #[test]
    fn test_cpa_item_omits_percentage_in_json() {
        let json = serde_json::to_value(CommissionLineItem::cpa(dec("50"))).unwrap();
        assert!(json.get("percentage").is_none());
        assert_eq!(json["value"], 50.0);
    }

    #[test]
    fn test_revshare_item_carries_percentage() {
        let json =
            serde_json::to_value(CommissionLineItem::revshare(dec("40"), dec("20"))).unwrap();
        assert_eq!(json["percentage"], 20.0);
    }
}
