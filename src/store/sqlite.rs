//! SQLite-backed [`CredentialStore`].

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::{str::FromStr, time::Duration};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{CredentialStore, Session, StoreError, User};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

#[derive(Clone, Debug)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database behind `dsn`.
    ///
    /// # Errors
    /// Returns an error if the DSN is malformed or the database cannot be opened.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(dsn)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply the embedded schema. Safe to run repeatedly.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let span = info_span!("db.migrate", db.system = "sqlite");
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    /// Single-connection in-memory database with the schema applied.
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = operation,
        db.statement = statement
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        login: row.try_get("login")?,
        password_hash: row.try_get("password_hash")?,
        is_admin: row.try_get("is_admin")?,
    })
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, StoreError> {
        let query = "INSERT INTO users (id, login, password_hash, is_admin) VALUES (?, ?, ?, 0)";
        let id = Uuid::new_v4();
        let result = sqlx::query(query)
            .bind(id)
            .bind(login)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(User {
                id,
                login: login.to_string(),
                password_hash: password_hash.to_string(),
                is_admin: false,
            }),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user_by_login(&self, login: &str) -> Result<User, StoreError> {
        let query = "SELECT id, login, password_hash, is_admin FROM users WHERE login = ?";
        let row = sqlx::query(query)
            .bind(login)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;

        row.as_ref().map_or(Err(StoreError::NotFound), user_from_row)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        let query = "SELECT id, login, password_hash, is_admin FROM users WHERE id = ?";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;

        row.as_ref().map_or(Err(StoreError::NotFound), user_from_row)
    }

    async fn create_session(&self, token: &str, user_id: Uuid) -> Result<Session, StoreError> {
        let query = "INSERT INTO sessions (token, user_id) VALUES (?, ?)";
        let result = sqlx::query(query)
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(Session {
                token: token.to_string(),
                user_id,
            }),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Session, StoreError> {
        let query = "SELECT token, user_id FROM sessions WHERE token = ?";
        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };

        Ok(Session {
            token: row.try_get("token")?,
            user_id: row.try_get("user_id")?,
        })
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        let query = "DELETE FROM sessions WHERE token = ?";
        sqlx::query(query)
            .bind(token)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await?;
        Ok(())
    }

    async fn set_admin(&self, login: &str, is_admin: bool) -> Result<User, StoreError> {
        let query = "UPDATE users SET is_admin = ? WHERE login = ?";
        let result = sqlx::query(query)
            .bind(is_admin)
            .bind(login)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.find_user_by_login(login).await
    }
}
