use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Profile and preferences attached 1:1 to a user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub avatar_url: Option<String>,
    pub theme: String,
    pub language: String,
    pub followers_count: i32,
    pub followees_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_LANGUAGE: &str = "en";
