use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;
use uuid::Uuid;

use super::session::{SessionData, SessionUser};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// The caller's session. `id` is `None` when no valid cookie came with the request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub id: Option<Uuid>,
    pub data: SessionData,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(&state.config.session.cookie_name) else {
            return Ok(Self::default());
        };

        let claims = match state.keys.verify(cookie.value()) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "session cookie rejected");
                return Ok(Self::default());
            }
        };

        match state.sessions.load(claims.sub).await? {
            Some(data) => Ok(Self {
                id: Some(claims.sub),
                data,
            }),
            None => Ok(Self::default()),
        }
    }
}

/// Logged-in user; rejects with 401 when the session is empty.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl CurrentUser {
    /// Owners act on their own resources; admins act on everything.
    pub fn ensure_can_act_for(&self, owner_id: i64) -> ApiResult<()> {
        if self.0.id == owner_id || self.0.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    pub fn ensure_admin(&self) -> ApiResult<()> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        session.data.user.map(CurrentUser).ok_or(ApiError::NoActiveSession)
    }
}
