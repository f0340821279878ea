use sqlx::{PgExecutor, PgPool};

use super::repo_types::{Account, DEFAULT_LANGUAGE, DEFAULT_THEME};

impl Account {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, avatar_url, theme, language,
                   followers_count, followees_count, created_at, updated_at
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, avatar_url, theme, language,
                   followers_count, followees_count, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Inserts the default account of a freshly created user.
    pub async fn create_default<'e, E>(exec: E, user_id: i64) -> Result<Account, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (user_id, theme, language)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, avatar_url, theme, language,
                      followers_count, followees_count, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(DEFAULT_THEME)
        .bind(DEFAULT_LANGUAGE)
        .fetch_one(exec)
        .await
    }
}
