//! Pipeline integration against the SQLite-backed directory, exercising the
//! same Repository both as lookup collaborator and as commission ledger.

use betlink::db::init_db;
use betlink::domain::{Affiliate, CommissionKind, CommissionType, Decimal, House};
use betlink::orchestration::{PipelineError, PostbackPipeline, PostbackRequest};
use betlink::{Directory, Repository};
use std::sync::Arc;
use tempfile::TempDir;

async fn setup() -> (PostbackPipeline, Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let directory: Arc<dyn Directory> = repo.clone();
    let pipeline = PostbackPipeline::new(directory, repo.clone());
    (pipeline, repo, temp_dir)
}

fn dec(s: &str) -> Decimal {
    Decimal::parse(s).unwrap()
}

fn request(house: &str, event: &str, subid: &str, amount: Option<&str>) -> PostbackRequest {
    PostbackRequest {
        house_identifier: house.to_string(),
        event_type: event.to_string(),
        subid: Some(subid.to_string()),
        amount: amount.map(String::from),
        customer_id: Some("player-1".to_string()),
    }
}

#[tokio::test]
async fn test_hybrid_lifecycle_over_sqlite() {
    let (pipeline, repo, _temp) = setup().await;
    repo.insert_house(&House {
        identifier: "bet365".to_string(),
        name: "Bet365".to_string(),
        commission_type: CommissionType::Hybrid,
        commission_value: dec("30"),
        cpa_value: Some(dec("50")),
        revshare_value: Some(dec("20")),
    })
    .await
    .unwrap();
    repo.insert_affiliate(&Affiliate::new("joao")).await.unwrap();

    // Acquisition first, then recurring revenue
    let first = pipeline
        .process(request("bet365", "first_deposit", "joao", None))
        .await
        .unwrap();
    assert_eq!(first.result.total.to_money_string(), "50.00");
    assert_eq!(first.result.items[0].kind, CommissionKind::Cpa);

    let deposit = pipeline
        .process(request("bet365", "deposit", "joao", Some("200")))
        .await
        .unwrap();
    assert_eq!(deposit.result.total.to_money_string(), "40.00");
    assert_eq!(deposit.result.items[0].kind, CommissionKind::RevShare);

    let rows = repo.query_commissions("joao", 0, i64::MAX).await.unwrap();
    assert_eq!(rows.len(), 2);

    let ledger_total = rows
        .iter()
        .fold(Decimal::zero(), |acc, row| acc + row.total);
    assert_eq!(ledger_total.to_money_string(), "90.00");
}

#[tokio::test]
async fn test_sqlite_directory_misses_classify() {
    let (pipeline, repo, _temp) = setup().await;
    repo.insert_affiliate(&Affiliate::new("joao")).await.unwrap();

    let err = pipeline
        .process(request("ghost", "deposit", "joao", Some("10")))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::HouseNotFound(_)));
}

#[tokio::test]
async fn test_stored_unknown_commission_type_yields_zero() {
    let (pipeline, repo, _temp) = setup().await;
    repo.insert_house(&House {
        identifier: "oddity".to_string(),
        name: "Oddity".to_string(),
        commission_type: CommissionType::parse("CPM"),
        commission_value: dec("10"),
        cpa_value: None,
        revshare_value: None,
    })
    .await
    .unwrap();
    repo.insert_affiliate(&Affiliate::new("joao")).await.unwrap();

    let outcome = pipeline
        .process(request("oddity", "registration", "joao", None))
        .await
        .unwrap();
    assert!(outcome.result.is_empty());
    assert!(!outcome.recorded);
}
