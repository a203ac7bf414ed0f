//! Partner house records and commission model resolution.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

/// Commission model a house pays under.
///
/// Stored as text; anything unrecognized decodes to `Unknown`, which yields
/// no commissions rather than failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommissionType {
    /// Flat amount per qualifying acquisition event.
    Cpa,
    /// Percentage of the reported monetary amount.
    RevShare,
    /// Independent CPA and RevShare rates on the same house.
    Hybrid,
    /// Unrecognized stored value.
    Unknown,
}

impl CommissionType {
    /// Decode a stored commission type string. Case-insensitive.
    pub fn parse(s: &str) -> CommissionType {
        match s.trim().to_lowercase().as_str() {
            "cpa" => CommissionType::Cpa,
            "revshare" => CommissionType::RevShare,
            "hybrid" => CommissionType::Hybrid,
            _ => CommissionType::Unknown,
        }
    }

    /// Canonical storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionType::Cpa => "CPA",
            CommissionType::RevShare => "RevShare",
            CommissionType::Hybrid => "Hybrid",
            CommissionType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for CommissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A partner betting operator.
///
/// Created by an administrator; read-only from the engine's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    /// Unique slug used in inbound webhook URLs. Immutable once created.
    pub identifier: String,
    /// Display name, echoed in responses.
    pub name: String,
    pub commission_type: CommissionType,
    /// Rate for single-model houses; Hybrid fallback rate.
    pub commission_value: Decimal,
    /// Hybrid CPA rate. `None` falls back to `commission_value`.
    pub cpa_value: Option<Decimal>,
    /// Hybrid RevShare percentage. `None` falls back to `commission_value`.
    pub revshare_value: Option<Decimal>,
}

impl House {
    /// The flat CPA rate this house pays, if its model includes CPA.
    ///
    /// Fallback is explicit Option resolution: a stored zero rate is a real
    /// zero, not an absent value.
    pub fn cpa_rate(&self) -> Option<Decimal> {
        match self.commission_type {
            CommissionType::Cpa => Some(self.commission_value),
            CommissionType::Hybrid => Some(self.cpa_value.unwrap_or(self.commission_value)),
            CommissionType::RevShare | CommissionType::Unknown => None,
        }
    }

    /// The RevShare percentage this house pays, if its model includes it.
    pub fn revshare_rate(&self) -> Option<Decimal> {
        match self.commission_type {
            CommissionType::RevShare => Some(self.commission_value),
            CommissionType::Hybrid => Some(self.revshare_value.unwrap_or(self.commission_value)),
            CommissionType::Cpa | CommissionType::Unknown => None,
        }
    }
}
