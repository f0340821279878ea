use sqlx::{PgExecutor, PgPool};

use super::repo_types::{NewUser, User, UserChanges};

const USER_COLUMNS: &str =
    "id, surname, given_name, handle, email, password_hash, role, created_at, updated_at";

impl User {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(db)
                .await?;
        Ok(user)
    }

    pub async fn exists(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let found: bool = sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)"#)
            .bind(id)
            .fetch_one(db)
            .await?;
        Ok(found)
    }

    /// Whether another user (not `except`) already uses `email`.
    pub async fn email_taken(db: &PgPool, email: &str, except: Option<i64>) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id IS DISTINCT FROM $2)"#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    pub async fn handle_taken(db: &PgPool, handle: &str, except: Option<i64>) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE handle = $1 AND id IS DISTINCT FROM $2)"#,
        )
        .bind(handle)
        .bind(except)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    /// Raw sqlx error so callers can tell constraint violations apart.
    pub async fn insert<'e, E>(exec: E, new: &NewUser) -> Result<User, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (surname, given_name, handle, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.surname)
        .bind(&new.given_name)
        .bind(&new.handle)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.role)
        .fetch_one(exec)
        .await
    }

    pub async fn update(db: &PgPool, id: i64, changes: &UserChanges) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                surname       = COALESCE($2, surname),
                given_name    = COALESCE($3, given_name),
                handle        = COALESCE($4, handle),
                email         = COALESCE($5, email),
                password_hash = COALESCE($6, password_hash),
                role          = COALESCE($7, role),
                updated_at    = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.surname)
        .bind(&changes.given_name)
        .bind(&changes.handle)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.role)
        .fetch_optional(db)
        .await
    }

    pub async fn update_password_by_email(
        db: &PgPool,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET password_hash = $2, updated_at = now()
            WHERE email = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Returns the number of rows removed; posts and account go with the user.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<u64> {
        let done = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(done.rows_affected())
    }
}
