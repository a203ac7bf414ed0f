//! Postback resolution pipeline.
//!
//! One inbound postback is one short-lived unit of work: validate, resolve
//! the two directory entities concurrently, evaluate the commission models,
//! aggregate, and hand the result to the ledger exactly once. The pipeline
//! holds no mutable state of its own; everything it needs is injected.

use crate::db::Repository;
use crate::directory::{Directory, DirectoryError};
use crate::domain::{
    parse_amount, Affiliate, CommissionRecord, CommissionResult, EventType, House, PostbackEvent,
};
use crate::engine::evaluate;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Raw postback parameters as extracted from the HTTP request.
#[derive(Debug, Clone, Default)]
pub struct PostbackRequest {
    pub house_identifier: String,
    pub event_type: String,
    pub subid: Option<String>,
    pub amount: Option<String>,
    pub customer_id: Option<String>,
}

/// Result of a completed resolution.
#[derive(Debug, Clone)]
pub struct PostbackOutcome {
    pub house: House,
    pub affiliate: Affiliate,
    pub event: PostbackEvent,
    pub result: CommissionResult,
    /// Whether a new ledger entry was written. False for duplicate
    /// deliveries and for events that earned nothing.
    pub recorded: bool,
    pub completed_at: DateTime<Utc>,
}

/// Processing stage, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Validating,
    ResolvingHouse,
    ResolvingAffiliate,
    Evaluating,
    Aggregating,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validating => "validating",
            Stage::ResolvingHouse => "resolving_house",
            Stage::ResolvingAffiliate => "resolving_affiliate",
            Stage::Evaluating => "evaluating",
            Stage::Aggregating => "aggregating",
            Stage::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}

/// Orchestrates postback resolution against injected directory and ledger
/// handles.
#[derive(Clone)]
pub struct PostbackPipeline {
    directory: Arc<dyn Directory>,
    repo: Arc<Repository>,
}

impl PostbackPipeline {
    pub fn new(directory: Arc<dyn Directory>, repo: Arc<Repository>) -> Self {
        Self { directory, repo }
    }

    /// Resolve one postback end to end.
    pub async fn process(
        &self,
        request: PostbackRequest,
    ) -> Result<PostbackOutcome, PipelineError> {
        self.trace(Stage::Received, &request);

        self.trace(Stage::Validating, &request);
        let event = validate(&request)?;

        // Independent lookups, issued concurrently and joined before
        // evaluation.
        self.trace(Stage::ResolvingHouse, &request);
        self.trace(Stage::ResolvingAffiliate, &request);
        let (house_lookup, affiliate_lookup) = futures::join!(
            self.directory.find_house_by_identifier(&event.house_identifier),
            self.directory.find_affiliate_by_username(&event.sub_id),
        );

        let house = house_lookup?.ok_or_else(|| {
            warn!(house = %event.house_identifier, "postback for unknown house");
            PipelineError::HouseNotFound(event.house_identifier.clone())
        })?;
        let affiliate = affiliate_lookup?.ok_or_else(|| {
            warn!(subid = %event.sub_id, "postback for unknown affiliate");
            PipelineError::AffiliateNotFound(event.sub_id.clone())
        })?;

        self.trace(Stage::Evaluating, &request);
        let items = evaluate(&house, event.event_type, event.amount);

        self.trace(Stage::Aggregating, &request);
        let result = CommissionResult::from_items(items);
        let completed_at = Utc::now();

        // Only qualifying events reach the ledger; zero-yield events are
        // acknowledged without a row.
        let recorded = if result.is_empty() {
            false
        } else {
            let record = CommissionRecord {
                event_key: event.event_key(),
                house_identifier: event.house_identifier.clone(),
                affiliate_username: affiliate.username.clone(),
                event_name: event.event_name.clone(),
                amount: event.amount,
                customer_id: event.customer_id.clone(),
                recorded_at_ms: completed_at.timestamp_millis(),
                result: result.clone(),
            };
            let inserted = self.repo.record_commission(&record).await?;
            if !inserted {
                info!(
                    event_key = %record.event_key,
                    "duplicate postback delivery, ledger entry already present"
                );
            }
            inserted
        };

        self.trace(Stage::Completed, &request);
        info!(
            house = %house.identifier,
            affiliate = %affiliate.username,
            event = %event.event_name,
            total = %result.total,
            recorded,
            "postback resolved"
        );

        Ok(PostbackOutcome {
            house,
            affiliate,
            event,
            result,
            recorded,
            completed_at,
        })
    }

    fn trace(&self, stage: Stage, request: &PostbackRequest) {
        debug!(
            stage = %stage,
            house = %request.house_identifier,
            event = %request.event_type,
            "postback stage"
        );
    }
}

fn validate(request: &PostbackRequest) -> Result<PostbackEvent, PipelineError> {
    let house_identifier = non_empty(Some(request.house_identifier.as_str()))
        .ok_or(PipelineError::MissingField("house identifier"))?;
    let event_name = non_empty(Some(request.event_type.as_str()))
        .ok_or(PipelineError::MissingField("event type"))?;
    let sub_id =
        non_empty(request.subid.as_deref()).ok_or(PipelineError::MissingField("subid"))?;

    Ok(PostbackEvent {
        event_type: EventType::parse(&event_name),
        house_identifier,
        event_name,
        sub_id,
        amount: parse_amount(request.amount.as_deref()),
        customer_id: non_empty(request.customer_id.as_deref()),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Error taxonomy for postback resolution.
///
/// Missing fields and unknown entities are expected operational outcomes;
/// directory and storage faults are the caller-should-retry class.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing {0} parameter")]
    MissingField(&'static str),
    #[error("house not found")]
    HouseNotFound(String),
    #[error("affiliate not found")]
    AffiliateNotFound(String),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::directory::InMemoryDirectory;
    use crate::domain::{CommissionKind, CommissionType, Decimal};
    use tempfile::TempDir;

    fn dec(s: &str) -> Decimal {
        Decimal::parse(s).unwrap()
    }

    fn hybrid_house() -> House {
        House {
            identifier: "bet365".to_string(),
            name: "Bet365".to_string(),
            commission_type: CommissionType::Hybrid,
            commission_value: dec("30"),
            cpa_value: Some(dec("50")),
            revshare_value: Some(dec("20")),
        }
    }

    async fn setup_pipeline(directory: InMemoryDirectory) -> (PostbackPipeline, Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Arc::new(Repository::new(pool));
        let pipeline = PostbackPipeline::new(Arc::new(directory), repo.clone());
        (pipeline, repo, temp_dir)
    }

    fn request(event: &str, subid: Option<&str>, amount: Option<&str>) -> PostbackRequest {
        PostbackRequest {
            house_identifier: "bet365".to_string(),
            event_type: event.to_string(),
            subid: subid.map(String::from),
            amount: amount.map(String::from),
            customer_id: Some("player-77".to_string()),
        }
    }

    fn seeded_directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_house(hybrid_house())
            .with_affiliate(Affiliate::new("joao"))
    }

    #[tokio::test]
    async fn test_first_deposit_earns_flat_cpa() {
        let (pipeline, _repo, _temp) = setup_pipeline(seeded_directory()).await;

        let outcome = pipeline
            .process(request("first_deposit", Some("joao"), None))
            .await
            .unwrap();

        assert_eq!(outcome.result.items.len(), 1);
        assert_eq!(outcome.result.items[0].kind, CommissionKind::Cpa);
        assert_eq!(outcome.result.total, dec("50"));
        assert!(outcome.recorded);
        assert_eq!(outcome.house.name, "Bet365");
        assert_eq!(outcome.affiliate.username, "joao");
    }

    #[tokio::test]
    async fn test_deposit_earns_revshare() {
        let (pipeline, _repo, _temp) = setup_pipeline(seeded_directory()).await;

        let outcome = pipeline
            .process(request("deposit", Some("joao"), Some("200")))
            .await
            .unwrap();

        assert_eq!(outcome.result.items.len(), 1);
        assert_eq!(outcome.result.items[0].kind, CommissionKind::RevShare);
        assert_eq!(outcome.result.total, dec("40"));
        assert_eq!(outcome.result.items[0].percentage, Some(dec("20")));
    }

    #[tokio::test]
    async fn test_unknown_event_acknowledged_without_ledger_row() {
        let (pipeline, repo, _temp) = setup_pipeline(seeded_directory()).await;

        let outcome = pipeline
            .process(request("click", Some("joao"), Some("200")))
            .await
            .unwrap();

        assert!(outcome.result.is_empty());
        assert!(outcome.result.total.is_zero());
        assert!(!outcome.recorded);

        let rows = repo.query_commissions("joao", 0, i64::MAX).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_house_classified() {
        let directory = InMemoryDirectory::new().with_affiliate(Affiliate::new("joao"));
        let (pipeline, _repo, _temp) = setup_pipeline(directory).await;

        let err = pipeline
            .process(request("deposit", Some("joao"), Some("200")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::HouseNotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_affiliate_classified() {
        let directory = InMemoryDirectory::new().with_house(hybrid_house());
        let (pipeline, _repo, _temp) = setup_pipeline(directory).await;

        let err = pipeline
            .process(request("deposit", Some("maria"), Some("200")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AffiliateNotFound(_)));
    }

    #[tokio::test]
    async fn test_both_unknown_house_wins() {
        let (pipeline, _repo, _temp) = setup_pipeline(InMemoryDirectory::new()).await;

        let err = pipeline
            .process(request("deposit", Some("maria"), Some("200")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::HouseNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_subid_rejected() {
        let (pipeline, _repo, _temp) = setup_pipeline(seeded_directory()).await;

        let err = pipeline
            .process(request("deposit", None, Some("200")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingField("subid")));

        let err = pipeline
            .process(request("deposit", Some("   "), Some("200")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingField("subid")));
    }

    #[tokio::test]
    async fn test_malformed_amount_tolerated() {
        let (pipeline, _repo, _temp) = setup_pipeline(seeded_directory()).await;

        let outcome = pipeline
            .process(request("deposit", Some("joao"), Some("not-a-number")))
            .await
            .unwrap();

        assert!(outcome.event.amount.is_zero());
        assert!(outcome.result.is_empty());
    }

    #[tokio::test]
    async fn test_directory_failure_surfaces() {
        let directory = seeded_directory().with_failing_lookups();
        let (pipeline, _repo, _temp) = setup_pipeline(directory).await;

        let err = pipeline
            .process(request("deposit", Some("joao"), Some("200")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Directory(_)));
    }

    #[tokio::test]
    async fn test_duplicate_delivery_records_once() {
        let (pipeline, repo, _temp) = setup_pipeline(seeded_directory()).await;

        let first = pipeline
            .process(request("deposit", Some("joao"), Some("200")))
            .await
            .unwrap();
        let second = pipeline
            .process(request("deposit", Some("joao"), Some("200")))
            .await
            .unwrap();

        assert!(first.recorded);
        assert!(!second.recorded);
        assert_eq!(second.result.total, dec("40"));

        let rows = repo.query_commissions("joao", 0, i64::MAX).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_amounts_record_separately() {
        let (pipeline, repo, _temp) = setup_pipeline(seeded_directory()).await;

        pipeline
            .process(request("deposit", Some("joao"), Some("200")))
            .await
            .unwrap();
        pipeline
            .process(request("deposit", Some("joao"), Some("300")))
            .await
            .unwrap();

        let rows = repo.query_commissions("joao", 0, i64::MAX).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_validation_rejects_blank_path_segments() {
        let (pipeline, _repo, _temp) = setup_pipeline(seeded_directory()).await;

        let mut blank_house = request("deposit", Some("joao"), None);
        blank_house.house_identifier = "  ".to_string();
        let err = pipeline.process(blank_house).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingField("house identifier")));

        let mut blank_event = request("deposit", Some("joao"), None);
        blank_event.event_type = String::new();
        let err = pipeline.process(blank_event).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingField("event type")));
    }
}
