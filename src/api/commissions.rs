use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::Decimal;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionsQuery {
    pub affiliate: String,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionsResponse {
    pub affiliate: String,
    pub total_commission: String,
    pub commission_count: i64,
    pub commissions: Vec<CommissionEntryDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionEntryDto {
    pub recorded_at_ms: i64,
    pub house: String,
    pub evento: String,
    pub amount: String,
    pub total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// Ledger read-back for an affiliate: everything the engine has credited,
/// optionally narrowed to a time window.
pub async fn get_commissions(
    Query(params): Query<CommissionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<CommissionsResponse>, AppError> {
    let affiliate = params.affiliate.trim().to_string();
    if affiliate.is_empty() {
        return Err(AppError::BadRequest("missing affiliate parameter".into()));
    }

    if let (Some(from_ms), Some(to_ms)) = (params.from_ms, params.to_ms) {
        if from_ms > to_ms {
            return Err(AppError::BadRequest("fromMs must be <= toMs".into()));
        }
    }

    let rows = state
        .repo
        .query_commissions(
            &affiliate,
            params.from_ms.unwrap_or(0),
            params.to_ms.unwrap_or(i64::MAX),
        )
        .await?;

    let mut total = Decimal::zero();
    for row in &rows {
        total = total + row.total;
    }

    let commission_count = rows.len() as i64;
    let commissions = rows
        .into_iter()
        .map(|row| CommissionEntryDto {
            recorded_at_ms: row.recorded_at_ms,
            house: row.house_identifier,
            evento: row.event_name,
            amount: row.amount.to_canonical_string(),
            total: row.total.to_money_string(),
            customer_id: row.customer_id,
        })
        .collect();

    Ok(Json(CommissionsResponse {
        affiliate,
        total_commission: total.to_money_string(),
        commission_count,
        commissions,
    }))
}
