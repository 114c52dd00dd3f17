//! Postgres backend (`didit_verifications` and `pharmacies` tables).

use crate::domain::pharmacy::{Pharmacy, PharmacyFilter, PharmacyStatus, PharmacyUpdate};
use crate::domain::verification::{SessionUpdate, VerificationSession, VerificationStatus};
use crate::storage::{
    apply_observation, Observation, PharmacyStore, StoreError, VerificationStore,
    ACTIVE_REGISTRATION_CONFLICT,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

const SESSION_COLUMNS: &str = "session_id, user_id, status, url, decision, created_at, updated_at";
const PHARMACY_COLUMNS: &str = "id, owner_user_id, name, license_number, address, city, phone, email, status, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects and creates the tables if they do not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS didit_verifications (
                session_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL,
                url TEXT,
                decision JSONB,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS didit_verifications_user_idx
                ON didit_verifications (user_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pharmacies (
                id UUID PRIMARY KEY,
                owner_user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                license_number TEXT NOT NULL,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                phone TEXT,
                email TEXT,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        // One active registration per user.
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS pharmacies_one_active_per_owner
                ON pharmacies (owner_user_id) WHERE status <> 'rejected'",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn session_from_row(row: &PgRow) -> Result<VerificationSession, StoreError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<VerificationStatus>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(VerificationSession {
        session_id: row.try_get("session_id")?,
        user_id: row.try_get("user_id")?,
        status,
        url: row.try_get("url")?,
        decision: row.try_get::<Option<JsonValue>, _>("decision")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn pharmacy_from_row(row: &PgRow) -> Result<Pharmacy, StoreError> {
    let status: String = row.try_get("status")?;
    let status = status.parse::<PharmacyStatus>().map_err(StoreError::Corrupt)?;
    Ok(Pharmacy {
        id: row.try_get("id")?,
        owner_user_id: row.try_get("owner_user_id")?,
        name: row.try_get("name")?,
        license_number: row.try_get("license_number")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Maps the partial unique index violation to a conflict.
fn map_unique(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict(ACTIVE_REGISTRATION_CONFLICT.to_string());
        }
    }
    StoreError::Database(e)
}

/// Inserts the row unless the session already exists. Returns whether a row was written.
async fn insert_session<'e, E>(executor: E, session: &VerificationSession) -> Result<bool, StoreError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        "INSERT INTO didit_verifications (session_id, user_id, status, url, decision, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (session_id) DO NOTHING",
    )
    .bind(&session.session_id)
    .bind(&session.user_id)
    .bind(session.status.as_str())
    .bind(&session.url)
    .bind(&session.decision)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl VerificationStore for PostgresStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, session: &VerificationSession) -> Result<bool, StoreError> {
        insert_session(&self.pool, session).await
    }

    async fn get(&self, session_id: &str) -> Result<Option<VerificationSession>, StoreError> {
        let sql = format!(
            "SELECT {} FROM didit_verifications WHERE session_id = $1",
            SESSION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn latest_for_user(&self, user_id: &str) -> Result<Option<VerificationSession>, StoreError> {
        let sql = format!(
            "SELECT {} FROM didit_verifications WHERE user_id = $1 ORDER BY created_at DESC, session_id DESC LIMIT 1",
            SESSION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn observe(
        &self,
        observation: Observation,
    ) -> Result<Option<(VerificationSession, SessionUpdate)>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Unknown sessions get a placeholder row first, so the lock below always holds a row.
        if let Some(user_id) = &observation.user_id {
            let placeholder = VerificationSession::new(
                observation.session_id.clone(),
                user_id.clone(),
                None,
                observation.observed_at,
            );
            insert_session(&mut *tx, &placeholder).await?;
        }

        let sql = format!(
            "SELECT {} FROM didit_verifications WHERE session_id = $1 FOR UPDATE",
            SESSION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&observation.session_id)
            .fetch_optional(&mut *tx)
            .await?;
        let existing = row.as_ref().map(session_from_row).transpose()?;

        let Some((session, update)) = apply_observation(existing, observation) else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE didit_verifications SET status = $2, url = $3, decision = $4, updated_at = $5
             WHERE session_id = $1",
        )
        .bind(&session.session_id)
        .bind(session.status.as_str())
        .bind(&session.url)
        .bind(&session.decision)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some((session, update)))
    }
}

#[async_trait]
impl PharmacyStore for PostgresStore {
    async fn create(&self, pharmacy: &Pharmacy) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO pharmacies
                (id, owner_user_id, name, license_number, address, city, phone, email, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(pharmacy.id)
        .bind(&pharmacy.owner_user_id)
        .bind(&pharmacy.name)
        .bind(&pharmacy.license_number)
        .bind(&pharmacy.address)
        .bind(&pharmacy.city)
        .bind(&pharmacy.phone)
        .bind(&pharmacy.email)
        .bind(pharmacy.status.as_str())
        .bind(pharmacy.created_at)
        .bind(pharmacy.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Pharmacy>, StoreError> {
        let sql = format!("SELECT {} FROM pharmacies WHERE id = $1", PHARMACY_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(pharmacy_from_row).transpose()
    }

    async fn list(&self, filter: &PharmacyFilter) -> Result<Vec<Pharmacy>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM pharmacies WHERE TRUE", PHARMACY_COLUMNS));
        if let Some(owner) = &filter.owner_user_id {
            qb.push(" AND owner_user_id = ").push_bind(owner.clone());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(pharmacy_from_row).collect()
    }

    async fn update(&self, id: Uuid, update: PharmacyUpdate) -> Result<Option<Pharmacy>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM pharmacies WHERE id = $1 FOR UPDATE",
            PHARMACY_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *tx).await?;
        let Some(mut pharmacy) = row.as_ref().map(pharmacy_from_row).transpose()? else {
            tx.rollback().await?;
            return Ok(None);
        };

        update.apply(&mut pharmacy, Utc::now());

        sqlx::query(
            "UPDATE pharmacies SET
                name = $2, license_number = $3, address = $4, city = $5,
                phone = $6, email = $7, status = $8, updated_at = $9
             WHERE id = $1",
        )
        .bind(pharmacy.id)
        .bind(&pharmacy.name)
        .bind(&pharmacy.license_number)
        .bind(&pharmacy.address)
        .bind(&pharmacy.city)
        .bind(&pharmacy.phone)
        .bind(&pharmacy.email)
        .bind(pharmacy.status.as_str())
        .bind(pharmacy.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?;

        tx.commit().await?;
        Ok(Some(pharmacy))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pharmacies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
