//! Repository layer for directory records and the commission ledger.

use crate::directory::{Directory, DirectoryError};
use crate::domain::{
    Affiliate, CommissionKind, CommissionLineItem, CommissionRecord, CommissionType, Decimal,
    House,
};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::warn;

/// Ledger row returned by commission queries, without line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionRow {
    pub event_key: String,
    pub house_identifier: String,
    pub affiliate_username: String,
    pub event_name: String,
    pub amount: Decimal,
    pub total: Decimal,
    pub customer_id: Option<String>,
    pub recorded_at_ms: i64,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    // =========================================================================
    // House directory
    // =========================================================================

    /// Insert a house record.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including identifier conflicts.
    pub async fn insert_house(&self, house: &House) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO houses (identifier, name, commission_type, commission_value, cpa_value, revshare_value)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&house.identifier)
        .bind(&house.name)
        .bind(house.commission_type.as_str())
        .bind(house.commission_value.to_canonical_string())
        .bind(house.cpa_value.map(|v| v.to_canonical_string()))
        .bind(house.revshare_value.map(|v| v.to_canonical_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a house by its URL slug.
    ///
    /// The identifier is UNIQUE in the schema; the ORDER BY keeps the result
    /// deterministic even against a hand-edited database.
    pub async fn find_house(&self, identifier: &str) -> Result<Option<House>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT identifier, name, commission_type, commission_value, cpa_value, revshare_value
            FROM houses
            WHERE identifier = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| house_from_row(&row)))
    }

    // =========================================================================
    // Affiliate directory
    // =========================================================================

    /// Insert an affiliate record.
    pub async fn insert_affiliate(&self, affiliate: &Affiliate) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO affiliates (username) VALUES (?)")
            .bind(&affiliate.username)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Look up an affiliate by username.
    pub async fn find_affiliate(&self, username: &str) -> Result<Option<Affiliate>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT username
            FROM affiliates
            WHERE username = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Affiliate::new(row.get::<String, _>("username"))))
    }

    // =========================================================================
    // Commission ledger
    // =========================================================================

    /// Record a computed commission idempotently.
    ///
    /// The header row and its line items are written in one transaction,
    /// keyed on `event_key`. A key already present leaves the ledger
    /// untouched.
    ///
    /// Returns true if a new ledger entry was written.
    pub async fn record_commission(&self, record: &CommissionRecord) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO commissions
                (event_key, house_identifier, affiliate_username, event_name, amount, total, customer_id, recorded_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(event_key) DO NOTHING
            "#,
        )
        .bind(&record.event_key)
        .bind(&record.house_identifier)
        .bind(&record.affiliate_username)
        .bind(&record.event_name)
        .bind(record.amount.to_canonical_string())
        .bind(record.result.total.to_canonical_string())
        .bind(record.customer_id.as_deref())
        .bind(record.recorded_at_ms)
        .execute(&mut *tx)
        .await?;

        let inserted = result.rows_affected() > 0;

        if inserted {
            for item in &record.result.items {
                sqlx::query(
                    r#"
                    INSERT INTO commission_items (event_key, kind, value, percentage)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(&record.event_key)
                .bind(item.kind.as_str())
                .bind(item.value.to_canonical_string())
                .bind(item.percentage.map(|p| p.to_canonical_string()))
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Query ledger rows for an affiliate within a time window, oldest first.
    pub async fn query_commissions(
        &self,
        affiliate_username: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<CommissionRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT event_key, house_identifier, affiliate_username, event_name, amount, total, customer_id, recorded_at_ms
            FROM commissions
            WHERE affiliate_username = ? AND recorded_at_ms >= ? AND recorded_at_ms <= ?
            ORDER BY recorded_at_ms, id
            "#,
        )
        .bind(affiliate_username)
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CommissionRow {
                event_key: row.get("event_key"),
                house_identifier: row.get("house_identifier"),
                affiliate_username: row.get("affiliate_username"),
                event_name: row.get("event_name"),
                amount: decimal_column(row.get("amount"), "commissions.amount"),
                total: decimal_column(row.get("total"), "commissions.total"),
                customer_id: row.get("customer_id"),
                recorded_at_ms: row.get("recorded_at_ms"),
            })
            .collect())
    }

    /// Query the line items recorded for one ledger entry.
    pub async fn query_commission_items(
        &self,
        event_key: &str,
    ) -> Result<Vec<CommissionLineItem>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT kind, value, percentage
            FROM commission_items
            WHERE event_key = ?
            ORDER BY id
            "#,
        )
        .bind(event_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let kind: String = row.get("kind");
                let Some(kind) = CommissionKind::parse(&kind) else {
                    warn!(%kind, event_key, "skipping ledger item with unknown kind");
                    return None;
                };
                Some(CommissionLineItem {
                    kind,
                    value: decimal_column(row.get("value"), "commission_items.value"),
                    percentage: row
                        .get::<Option<String>, _>("percentage")
                        .and_then(|p| Decimal::parse(&p).ok()),
                })
            })
            .collect())
    }
}

fn house_from_row(row: &sqlx::sqlite::SqliteRow) -> House {
    let commission_type: String = row.get("commission_type");
    House {
        identifier: row.get("identifier"),
        name: row.get("name"),
        commission_type: CommissionType::parse(&commission_type),
        commission_value: decimal_column(row.get("commission_value"), "houses.commission_value"),
        cpa_value: optional_decimal_column(row.get("cpa_value"), "houses.cpa_value"),
        revshare_value: optional_decimal_column(row.get("revshare_value"), "houses.revshare_value"),
    }
}

fn decimal_column(raw: String, column: &str) -> Decimal {
    Decimal::parse(&raw).unwrap_or_else(|_| {
        warn!(column, %raw, "unparseable decimal column, treating as zero");
        Decimal::zero()
    })
}

fn optional_decimal_column(raw: Option<String>, column: &str) -> Option<Decimal> {
    let raw = raw?;
    match Decimal::parse(&raw) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(column, %raw, "unparseable decimal column, treating as absent");
            None
        }
    }
}

#[async_trait]
impl Directory for Repository {
    async fn find_house_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<House>, DirectoryError> {
        Ok(self.find_house(identifier).await?)
    }

    async fn find_affiliate_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Affiliate>, DirectoryError> {
        Ok(self.find_affiliate(username).await?)
    }
}
