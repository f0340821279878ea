use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::repo_types::ROLE_ADMIN;

/// What a session remembers about the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub role: String,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Expired sessions load as `None`.
    async fn load(&self, id: Uuid) -> anyhow::Result<Option<SessionData>>;
    async fn save(&self, id: Uuid, data: &SessionData, expires_at: OffsetDateTime) -> anyhow::Result<()>;
    async fn destroy(&self, id: Uuid) -> anyhow::Result<()>;
    /// Drops every expired session; returns how many went.
    async fn prune_expired(&self) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, id: Uuid) -> anyhow::Result<Option<SessionData>> {
        let row: Option<Json<SessionData>> = sqlx::query_scalar(
            r#"SELECT data FROM sessions WHERE id = $1 AND expires_at > now()"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("load session")?;
        Ok(row.map(|Json(data)| data))
    }

    async fn save(&self, id: Uuid, data: &SessionData, expires_at: OffsetDateTime) -> anyhow::Result<()> {
        self.prune_expired().await?;
        sqlx::query(
            r#"
            INSERT INTO sessions (id, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(id)
        .bind(Json(data))
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("save session")?;
        Ok(())
    }

    async fn destroy(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM sessions WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("destroy session")?;
        Ok(())
    }

    async fn prune_expired(&self) -> anyhow::Result<u64> {
        let done = sqlx::query(r#"DELETE FROM sessions WHERE expires_at <= now()"#)
            .execute(&self.db)
            .await
            .context("prune expired sessions")?;
        Ok(done.rows_affected())
    }
}

/// Process-local sessions, lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<Uuid, (SessionData, OffsetDateTime)>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: Uuid) -> anyhow::Result<Option<SessionData>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .inner
            .read()
            .await
            .get(&id)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(data, _)| data.clone()))
    }

    async fn save(&self, id: Uuid, data: &SessionData, expires_at: OffsetDateTime) -> anyhow::Result<()> {
        self.prune_expired().await?;
        self.inner.write().await.insert(id, (data.clone(), expires_at));
        Ok(())
    }

    async fn destroy(&self, id: Uuid) -> anyhow::Result<()> {
        self.inner.write().await.remove(&id);
        Ok(())
    }

    async fn prune_expired(&self) -> anyhow::Result<u64> {
        let mut map = self.inner.write().await;
        let now = OffsetDateTime::now_utc();
        let before = map.len();
        map.retain(|_, (_, exp)| *exp > now);
        Ok((before - map.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn alice() -> SessionData {
        SessionData {
            user: Some(SessionUser {
                id: 1,
                email: "alice@example.com".into(),
                role: "user".into(),
            }),
        }
    }

    #[tokio::test]
    async fn memory_store_roundtrip_and_destroy() {
        let store = MemorySessionStore::default();
        let id = Uuid::new_v4();
        store
            .save(id, &alice(), OffsetDateTime::now_utc() + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(store.load(id).await.unwrap(), Some(alice()));

        store.destroy(id).await.unwrap();
        assert_eq!(store.load(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_hides_expired_sessions() {
        let store = MemorySessionStore::default();
        let id = Uuid::new_v4();
        store
            .save(id, &alice(), OffsetDateTime::now_utc() - Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(store.load(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn saving_drops_other_expired_sessions() {
        let store = MemorySessionStore::default();
        let now = OffsetDateTime::now_utc();
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();
        store.save(stale, &alice(), now - Duration::seconds(1)).await.unwrap();
        store.save(live, &alice(), now + Duration::minutes(5)).await.unwrap();

        assert_eq!(store.inner.read().await.len(), 1);
        assert!(store.inner.read().await.contains_key(&live));
        assert_eq!(store.prune_expired().await.unwrap(), 0);
    }

    #[test]
    fn empty_session_serializes_without_user() {
        assert_eq!(serde_json::to_string(&SessionData::default()).unwrap(), "{}");
        let back: SessionData = serde_json::from_str("{}").unwrap();
        assert!(back.user.is_none());
    }

    #[test]
    fn admin_role_is_recognized() {
        let mut user = alice().user.unwrap();
        assert!(!user.is_admin());
        user.role = "admin".into();
        assert!(user.is_admin());
    }
}
