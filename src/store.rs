use chrono::{TimeZone, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseSettings;
use crate::domain::{Pagination, Subscriber, SubscriberEmail, SubscriberUpdate};
use crate::utils::error_chain_fmt;

// Extended result codes reported by SQLite for uniqueness violations
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";

const CREATE_EMAILS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS emails (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        email         TEXT NOT NULL UNIQUE,
        confirmed_at  INTEGER NOT NULL DEFAULT 0,
        opt_out       INTEGER NOT NULL DEFAULT 0
    )
"#;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("A subscriber with email {email} already exists.")]
    Conflict {
        email: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Subscriber {id} holds an invalid confirmation timestamp {confirmed_at}.")]
    InvalidRow { id: i64, confirmed_at: i64 },
    #[error("Subscriber {0} is missing right after being written.")]
    Missing(String),
    #[error("Subscriber store query failed: {0}")]
    Database(#[from] sqlx::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    email: String,
    confirmed_at: i64,
    opt_out: bool,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = StoreError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let confirmed_at = Utc
            .timestamp_opt(row.confirmed_at, 0)
            .single()
            .ok_or(StoreError::InvalidRow {
                id: row.id,
                confirmed_at: row.confirmed_at,
            })?;

        Ok(Subscriber {
            id: row.id,
            email: row.email,
            confirmed_at,
            opt_out: row.opt_out,
        })
    }
}

/// Persistent table of subscribers.
///
/// Every operation is a single statement, atomic on its own. Writers are serialized by
/// SQLite itself, so the store is cheap to clone and share between servers.
#[derive(Clone, Debug)]
pub struct SubscriberStore {
    pool: SqlitePool,
}

impl SubscriberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the emails table unless it already exists.
    #[tracing::instrument(name = "Ensuring the subscribers schema exists", skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_EMAILS_TABLE)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "Insert a new subscriber into the database",
        skip(self, email),
        fields(subscriber_email = %email)
    )]
    pub async fn create(&self, email: &SubscriberEmail) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO emails (email, confirmed_at, opt_out)
            VALUES (?, 0, 0)
            "#,
        )
        .bind(email.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::Conflict {
                    email: email.to_string(),
                    source: err,
                }
            } else {
                tracing::error!("Failed to execute query: {:?}", err);
                StoreError::Database(err)
            }
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetch a subscriber by email", skip(self))]
    pub async fn get(&self, email: &str) -> Result<Option<Subscriber>, StoreError> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, confirmed_at, opt_out
            FROM emails
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subscriber::try_from).transpose()
    }

    /// Upsert keyed on email: inserts the subscriber when absent, otherwise overwrites
    /// both `confirmed_at` and `opt_out`.
    #[tracing::instrument(
        name = "Upsert a subscriber",
        skip(self, update),
        fields(
            subscriber_email = %update.email,
            confirmed_at = %update.confirmed_at.timestamp(),
            opt_out = %update.opt_out
        )
    )]
    pub async fn update(&self, update: &SubscriberUpdate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO emails (email, confirmed_at, opt_out)
            VALUES (?, ?, ?)
            ON CONFLICT (email) DO UPDATE
            SET confirmed_at = excluded.confirmed_at, opt_out = excluded.opt_out
            "#,
        )
        .bind(update.email.as_ref())
        .bind(update.confirmed_at.timestamp())
        .bind(update.opt_out)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft delete: flags the subscriber as opted out. An unknown email affects no rows
    /// and is not an error.
    #[tracing::instrument(name = "Opt out a subscriber", skip(self))]
    pub async fn delete(&self, email: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE emails
            SET opt_out = 1
            WHERE email = ?
            "#,
        )
        .bind(email)
        .execute(&self.pool)
        .await?;

        tracing::debug!(rows_affected = result.rows_affected(), "Opt out applied");

        Ok(())
    }

    /// Active subscribers in id order, one page at a time.
    #[tracing::instrument(name = "List active subscribers", skip(self))]
    pub async fn list(&self, pagination: &Pagination) -> Result<Vec<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, confirmed_at, opt_out
            FROM emails
            WHERE opt_out = 0
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Subscriber::try_from)
        .collect()
    }
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(config.get_max_connections())
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(
                db_err.code().as_deref(),
                Some(SQLITE_CONSTRAINT_UNIQUE) | Some(SQLITE_CONSTRAINT_PRIMARYKEY)
            ) || db_err.message().starts_with("UNIQUE constraint failed")
        }
        _ => false,
    }
}
