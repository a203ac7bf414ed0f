//! Commission model evaluator.
//!
//! The algorithmic heart of the platform: a pure, total function from
//! (house, event type, amount) to the commission line items owed. Both
//! rules are applied independently, so a Hybrid house can in principle earn
//! two items from one event; the event-type sets keep that from happening
//! in practice.

use crate::domain::{CommissionLineItem, Decimal, EventType, House};

/// Evaluate which commissions an event earns for its affiliate.
///
/// Rules:
/// - CPA fires on acquisition events (registration, first deposit) for
///   houses whose model includes a CPA rate. The payout is the flat rate,
///   never scaled by `amount`.
/// - RevShare fires on revenue events (deposit, profit) with a positive
///   amount for houses whose model includes a RevShare percentage. The
///   payout is `amount * percentage / 100`.
///
/// Unknown event types and unknown commission models yield an empty
/// sequence; the event is still acknowledged upstream.
pub fn evaluate(house: &House, event_type: EventType, amount: Decimal) -> Vec<CommissionLineItem> {
    let mut items = Vec::new();

    if event_type.is_acquisition() {
        if let Some(rate) = house.cpa_rate() {
            items.push(CommissionLineItem::cpa(rate));
        }
    }

    if event_type.is_revenue() && amount.is_positive() {
        if let Some(percentage) = house.revshare_rate() {
            items.push(CommissionLineItem::revshare(
                percentage.percent_of(amount),
                percentage,
            ));
        }
    }

    items
}
