use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;

use super::code::ResetCode;

/// Row of `verification_tokens`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VerificationToken {
    pub id: i64,
    pub email: String,
    pub code: String,
    pub expired_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl VerificationToken {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expired_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct NewVerificationToken {
    pub email: String,
    pub code: ResetCode,
    pub expired_at: OffsetDateTime,
}

const EMAIL_KEY: &str = "verification_tokens_email_key";
const CODE_KEY: &str = "verification_tokens_code_key";

/// Why `insert` refused a row.
#[derive(Debug, Error)]
pub enum InsertError {
    #[error("a verification token already exists for this email")]
    EmailTaken,
    #[error("the reset code is already stored")]
    CodeTaken,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InsertError {
    /// Maps a violated unique constraint of `verification_tokens`.
    fn for_constraint(constraint: Option<&str>) -> Option<Self> {
        match constraint {
            Some(EMAIL_KEY) => Some(Self::EmailTaken),
            Some(CODE_KEY) => Some(Self::CodeTaken),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for InsertError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                if let Some(known) = Self::for_constraint(db.constraint()) {
                    return known;
                }
            }
        }
        Self::Other(anyhow::Error::new(e).context("insert verification token"))
    }
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn code_exists(&self, code: &str) -> anyhow::Result<bool>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<VerificationToken>>;
    async fn find(&self, email: &str, code: &str) -> anyhow::Result<Option<VerificationToken>>;
    async fn insert(&self, token: &NewVerificationToken) -> Result<VerificationToken, InsertError>;
    /// Returns the number of rows removed.
    async fn delete_by_email(&self, email: &str) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgTokenStore {
    db: PgPool,
}

impl PgTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn code_exists(&self, code: &str) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM verification_tokens WHERE code = $1"#,
        )
        .bind(code)
        .fetch_one(&self.db)
        .await
        .context("count verification tokens by code")?;
        Ok(count != 0)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, VerificationToken>(
            r#"
            SELECT id, email, code, expired_at, created_at
            FROM verification_tokens
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find verification token by email")?;
        Ok(row)
    }

    async fn find(&self, email: &str, code: &str) -> anyhow::Result<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, VerificationToken>(
            r#"
            SELECT id, email, code, expired_at, created_at
            FROM verification_tokens
            WHERE email = $1 AND code = $2
            "#,
        )
        .bind(email)
        .bind(code)
        .fetch_optional(&self.db)
        .await
        .context("find verification token")?;
        Ok(row)
    }

    async fn insert(&self, token: &NewVerificationToken) -> Result<VerificationToken, InsertError> {
        let row = sqlx::query_as::<_, VerificationToken>(
            r#"
            INSERT INTO verification_tokens (email, code, expired_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, code, expired_at, created_at
            "#,
        )
        .bind(&token.email)
        .bind(token.code.as_str())
        .bind(token.expired_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_by_email(&self, email: &str) -> anyhow::Result<u64> {
        let done = sqlx::query(r#"DELETE FROM verification_tokens WHERE email = $1"#)
            .bind(email)
            .execute(&self.db)
            .await
            .context("delete verification token")?;
        Ok(done.rows_affected())
    }
}
