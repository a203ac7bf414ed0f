use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{CommissionKind, Decimal};
use crate::error::AppError;
use crate::orchestration::{PostbackOutcome, PostbackRequest};

#[derive(Debug, Deserialize)]
pub struct PostbackQuery {
    pub subid: Option<String>,
    /// Raw string so malformed numbers can be tolerated instead of failing
    /// extraction.
    pub amount: Option<String>,
    pub customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostbackResponse {
    pub success: bool,
    pub affiliate: String,
    pub house: String,
    pub evento: String,
    pub amount: Decimal,
    #[serde(rename = "totalCommission")]
    pub total_commission: String,
    pub commissions: Vec<CommissionItemDto>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct CommissionItemDto {
    #[serde(rename = "type")]
    pub kind: CommissionKind,
    pub value: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
}

impl From<PostbackOutcome> for PostbackResponse {
    fn from(outcome: PostbackOutcome) -> Self {
        PostbackResponse {
            success: true,
            affiliate: outcome.affiliate.username,
            house: outcome.house.name,
            evento: outcome.event.event_name,
            amount: outcome.event.amount,
            total_commission: outcome.result.total.to_money_string(),
            commissions: outcome
                .result
                .items
                .into_iter()
                .map(|item| CommissionItemDto {
                    kind: item.kind,
                    value: item.value,
                    percentage: item.percentage,
                })
                .collect(),
            timestamp: outcome
                .completed_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

pub async fn handle_postback(
    Path((house_identifier, event_type)): Path<(String, String)>,
    Query(params): Query<PostbackQuery>,
    State(state): State<AppState>,
) -> Result<Json<PostbackResponse>, AppError> {
    let request = PostbackRequest {
        house_identifier,
        event_type,
        subid: params.subid,
        amount: params.amount,
        customer_id: params.customer_id,
    };

    let outcome = state.pipeline.process(request).await?;
    Ok(Json(PostbackResponse::from(outcome)))
}
