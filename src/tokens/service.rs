use std::sync::Arc;

use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use super::{
    code::ResetCode,
    store::{InsertError, NewVerificationToken, TokenStore, VerificationToken},
};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired or invalid")]
    ExpiredOrInvalid,
    #[error("a live reset token already exists for this email")]
    AlreadyRequested,
    #[error("no reset token exists for this email")]
    NotFound,
    #[error("token storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Issues, persists and checks reset tokens against a [`TokenStore`].
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Samples codes until one is unused in storage. Retries are unbounded:
    /// at 128 bits a collision is not expected in practice.
    pub async fn generate(&self) -> Result<ResetCode, TokenError> {
        loop {
            let code = ResetCode::random();
            if !self.store.code_exists(code.as_str()).await? {
                return Ok(code);
            }
            debug!("reset code collision, sampling again");
        }
    }

    pub async fn set(
        &self,
        email: &str,
        code: &ResetCode,
        expired_at: OffsetDateTime,
    ) -> Result<VerificationToken, TokenError> {
        if let Some(prior) = self.store.find_by_email(email).await? {
            if !prior.is_expired_at(OffsetDateTime::now_utc()) {
                return Err(TokenError::AlreadyRequested);
            }
            self.store.delete_by_email(email).await?;
            debug!(token_id = prior.id, "expired reset token replaced");
        }

        let new = NewVerificationToken {
            email: email.to_string(),
            code: code.clone(),
            expired_at,
        };
        match self.store.insert(&new).await {
            Ok(row) => Ok(row),
            Err(InsertError::EmailTaken) => Err(TokenError::AlreadyRequested),
            Err(InsertError::CodeTaken) => Err(TokenError::Storage(anyhow::anyhow!(
                "reset code was stored by another request"
            ))),
            Err(InsertError::Other(e)) => Err(TokenError::Storage(e)),
        }
    }

    /// Generates a fresh code and stores it for `email`, valid for `ttl`.
    pub async fn issue(&self, email: &str, ttl: Duration) -> Result<VerificationToken, TokenError> {
        let code = self.generate().await?;
        let row = self.set(email, &code, OffsetDateTime::now_utc() + ttl).await?;
        info!(token_id = row.id, expired_at = %row.expired_at, "reset token issued");
        Ok(row)
    }

    /// Succeeds iff a row matches both values and has not expired. The row is left in place.
    pub async fn assert_valid(&self, email: &str, code: &ResetCode) -> Result<(), TokenError> {
        match self.store.find(email, code.as_str()).await? {
            Some(row) if !row.is_expired_at(OffsetDateTime::now_utc()) => Ok(()),
            _ => Err(TokenError::ExpiredOrInvalid),
        }
    }

    pub async fn delete(&self, email: &str) -> Result<(), TokenError> {
        match self.store.delete_by_email(email).await? {
            0 => Err(TokenError::NotFound),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::testing::MemoryTokenStore;

    const EMAIL: &str = "a@b.com";

    fn service(store: Arc<MemoryTokenStore>) -> TokenService {
        TokenService::new(store)
    }

    #[tokio::test]
    async fn generate_retries_once_after_collision() {
        let store = Arc::new(MemoryTokenStore::default());
        store.script_exists([true, false]);

        let code = service(store.clone()).generate().await.unwrap();

        let checked = store.checked_codes();
        assert_eq!(checked.len(), 2);
        assert_eq!(code.as_str(), checked[1]);
        assert!(ResetCode::is_valid(code.as_str()));
    }

    #[tokio::test]
    async fn generate_returns_first_sample_when_unused() {
        let store = Arc::new(MemoryTokenStore::default());
        let code = service(store.clone()).generate().await.unwrap();
        assert_eq!(store.checked_codes(), vec![code.as_str().to_string()]);
    }

    #[tokio::test]
    async fn set_replaces_expired_token_delete_before_insert() {
        let now = OffsetDateTime::now_utc();
        let store = Arc::new(MemoryTokenStore::default());
        let svc = service(store.clone());
        let x = ResetCode::random();
        let y = ResetCode::random();

        svc.set(EMAIL, &x, now - Duration::hours(1)).await.unwrap();
        svc.set(EMAIL, &y, now + Duration::hours(3)).await.unwrap();

        let ops = store.ops();
        let delete_at = ops.iter().position(|op| op == &format!("delete {EMAIL}")).unwrap();
        let insert_y_at = ops
            .iter()
            .position(|op| op == &format!("insert {EMAIL} {y}"))
            .unwrap();
        assert!(delete_at < insert_y_at, "ops out of order: {ops:?}");

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, y.as_str());
    }

    #[tokio::test]
    async fn set_rejects_while_prior_token_is_live() {
        let now = OffsetDateTime::now_utc();
        let store = Arc::new(MemoryTokenStore::with_row(
            EMAIL,
            "00112233445566778899aabbccddeeff",
            now + Duration::hours(2),
        ));
        let err = service(store.clone())
            .set(EMAIL, &ResetCode::random(), now + Duration::hours(3))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::AlreadyRequested));
        assert!(!store.ops().iter().any(|op| op.starts_with("delete")));
    }

    #[tokio::test]
    async fn set_reports_code_clash_as_storage() {
        let now = OffsetDateTime::now_utc();
        let taken = "00112233445566778899aabbccddeeff";
        let store = Arc::new(MemoryTokenStore::with_row("other@b.com", taken, now + Duration::hours(1)));
        let code = ResetCode::parse(taken).unwrap();
        let err = service(store)
            .set(EMAIL, &code, now + Duration::hours(3))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Storage(_)));
    }

    /// A concurrent request that inserts between our lookup and our insert.
    struct RacingStore;

    #[async_trait::async_trait]
    impl TokenStore for RacingStore {
        async fn code_exists(&self, _code: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<VerificationToken>> {
            Ok(None)
        }
        async fn find(&self, _email: &str, _code: &str) -> anyhow::Result<Option<VerificationToken>> {
            Ok(None)
        }
        async fn insert(&self, _token: &NewVerificationToken) -> Result<VerificationToken, InsertError> {
            Err(InsertError::EmailTaken)
        }
        async fn delete_by_email(&self, _email: &str) -> anyhow::Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn set_reports_email_clash_on_insert_as_already_requested() {
        let err = TokenService::new(Arc::new(RacingStore))
            .set(EMAIL, &ResetCode::random(), OffsetDateTime::now_utc() + Duration::hours(3))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::AlreadyRequested));
    }

    #[tokio::test]
    async fn set_reports_broken_insert_as_storage() {
        let store = Arc::new(MemoryTokenStore::default());
        store.fail_inserts();
        let err = service(store)
            .set(EMAIL, &ResetCode::random(), OffsetDateTime::now_utc() + Duration::hours(3))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Storage(_)));
    }

    #[tokio::test]
    async fn assert_valid_fails_without_matching_row() {
        let store = Arc::new(MemoryTokenStore::default());
        let code = ResetCode::parse("deadbeefdeadbeefdeadbeefdeadbeef").unwrap();
        let err = service(store).assert_valid(EMAIL, &code).await.unwrap_err();
        assert!(matches!(err, TokenError::ExpiredOrInvalid));
    }

    #[tokio::test]
    async fn assert_valid_fails_for_expired_row() {
        let code = "deadbeefdeadbeefdeadbeefdeadbeef";
        let store = Arc::new(MemoryTokenStore::with_row(
            EMAIL,
            code,
            OffsetDateTime::now_utc() - Duration::minutes(1),
        ));
        let err = service(store)
            .assert_valid(EMAIL, &ResetCode::parse(code).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::ExpiredOrInvalid));
    }

    #[tokio::test]
    async fn assert_valid_fails_when_email_differs() {
        let code = "deadbeefdeadbeefdeadbeefdeadbeef";
        let store = Arc::new(MemoryTokenStore::with_row(
            "someone@else.org",
            code,
            OffsetDateTime::now_utc() + Duration::hours(1),
        ));
        let err = service(store)
            .assert_valid(EMAIL, &ResetCode::parse(code).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::ExpiredOrInvalid));
    }

    #[tokio::test]
    async fn assert_valid_leaves_live_token_in_place() {
        let code = "deadbeefdeadbeefdeadbeefdeadbeef";
        let store = Arc::new(MemoryTokenStore::with_row(
            EMAIL,
            code,
            OffsetDateTime::now_utc() + Duration::hours(1),
        ));
        let svc = service(store.clone());
        let parsed = ResetCode::parse(code).unwrap();
        svc.assert_valid(EMAIL, &parsed).await.unwrap();
        svc.assert_valid(EMAIL, &parsed).await.unwrap();
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn issue_stores_code_with_ttl() {
        let store = Arc::new(MemoryTokenStore::default());
        let before = OffsetDateTime::now_utc();
        let row = service(store.clone()).issue(EMAIL, Duration::hours(3)).await.unwrap();
        assert!(ResetCode::is_valid(&row.code));
        assert!(row.expired_at >= before + Duration::hours(3));
        assert!(row.expired_at <= OffsetDateTime::now_utc() + Duration::hours(3));
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_missing_row() {
        let store = Arc::new(MemoryTokenStore::default());
        let err = service(store).delete(EMAIL).await.unwrap_err();
        assert!(matches!(err, TokenError::NotFound));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = Arc::new(MemoryTokenStore::with_row(
            EMAIL,
            "deadbeefdeadbeefdeadbeefdeadbeef",
            OffsetDateTime::now_utc() + Duration::hours(1),
        ));
        service(store.clone()).delete(EMAIL).await.unwrap();
        assert!(store.rows().is_empty());
    }
}
