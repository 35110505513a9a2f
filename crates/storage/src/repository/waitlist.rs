use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::WaitlistEntry;

use super::{WaitlistStore, WaitlistTransaction};

const ENTRY_COLUMNS: &str = r#"
    id, event_id, user_id, position, status, joined_at,
    offered_at, expires_at, responded_at, notes
"#;

/// PostgreSQL-backed waitlist store
#[derive(Debug, Clone)]
pub struct WaitlistRepository {
    pool: PgPool,
}

impl WaitlistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WaitlistStore for WaitlistRepository {
    async fn find_by_id(&self, entry_id: Uuid) -> Result<Option<WaitlistEntry>> {
        let entry = sqlx::query_as::<_, WaitlistEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM waitlist_entries WHERE id = $1"
        ))
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn events_with_overdue_offers(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let events = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT event_id
            FROM waitlist_entries
            WHERE status = 'offered' AND expires_at < $1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn begin(&self, event_id: Uuid) -> Result<Box<dyn WaitlistTransaction>> {
        let mut tx = self.pool.begin().await?;

        // Held until commit or rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(event_id.to_string())
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgWaitlistTransaction { tx, event_id }))
    }
}

struct PgWaitlistTransaction {
    tx: Transaction<'static, Postgres>,
    event_id: Uuid,
}

#[async_trait]
impl WaitlistTransaction for PgWaitlistTransaction {
    async fn entries(&mut self) -> Result<Vec<WaitlistEntry>> {
        let entries = sqlx::query_as::<_, WaitlistEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM waitlist_entries WHERE event_id = $1"
        ))
        .bind(self.event_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(entries)
    }

    async fn insert(&mut self, entry: &WaitlistEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO waitlist_entries (
                id, event_id, user_id, position, status, joined_at,
                offered_at, expires_at, responded_at, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(entry.event_id)
        .bind(entry.user_id)
        .bind(entry.position)
        .bind(entry.status)
        .bind(entry.joined_at)
        .bind(entry.offered_at)
        .bind(entry.expires_at)
        .bind(entry.responded_at)
        .bind(&entry.notes)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                return StorageError::ConstraintViolation(
                    "Active waitlist entry already exists".to_string(),
                );
            }
            err
        })?;

        Ok(())
    }

    async fn update(&mut self, entry: &WaitlistEntry) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE waitlist_entries
            SET position = $2,
                status = $3,
                offered_at = $4,
                expires_at = $5,
                responded_at = $6,
                notes = $7
            WHERE id = $1 AND event_id = $8
            "#,
        )
        .bind(entry.id)
        .bind(entry.position)
        .bind(entry.status)
        .bind(entry.offered_at)
        .bind(entry.expires_at)
        .bind(entry.responded_at)
        .bind(&entry.notes)
        .bind(self.event_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn delete(&mut self, entry_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM waitlist_entries WHERE id = $1 AND event_id = $2")
            .bind(entry_id)
            .bind(self.event_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
