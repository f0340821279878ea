use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    cookie::{removal_cookie, session_cookie},
    dto::{LoginRequest, RegisterRequest, SessionStatus},
    extractors::Session,
    keys::SessionKeys,
    services,
    session::SessionUser,
};
use crate::{
    error::{ApiError, ApiResult},
    extract::ValidJson,
    response::{message, Message},
    state::AppState,
    users::{self, repo_types::PublicUser},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout).post(logout))
        .route("/auth/session", get(session_status))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> ApiResult<Json<Message<PublicUser>>> {
    let user = users::services::create(&state.db, &state.hasher, payload.into()).await?;
    Ok(message(
        &format!("user registered ({})", user.id),
        "Your account was created, you can now log in.",
        PublicUser::from(user),
    ))
}

#[instrument(skip(state, keys, session, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    State(keys): State<SessionKeys>,
    session: Session,
    jar: CookieJar,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<Message<SessionUser>>)> {
    let email = payload.email.trim().to_lowercase();
    let user = services::login(&state.db, &state.hasher, &email, &payload.password).await?;
    let view = user.session_view();
    let data = services::set_session(&session.data, view.clone())?;

    let session_id = Uuid::new_v4();
    let (token, expires_at) = keys.sign(session_id)?;
    state.sessions.save(session_id, &data, expires_at).await?;

    info!(user_id = user.id, "user logged in");
    let jar = jar.add(session_cookie(&state.config.session, token));
    Ok((
        jar,
        message(&format!("user login ({})", user.id), "Logged in.", view),
    ))
}

#[instrument(skip(state, session, jar))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<Message<()>>)> {
    if let Some(id) = session.id {
        state.sessions.destroy(id).await?;
        info!(session_id = %id, "session destroyed");
    }
    let jar = jar.remove(removal_cookie(&state.config.session));
    Ok((jar, message("", "You have been logged out.", ())))
}

#[instrument(skip(session))]
pub async fn session_status(session: Session) -> ApiResult<Json<Message<SessionStatus>>> {
    let user = session.data.user.ok_or(ApiError::NoActiveSession)?;
    Ok(message(
        "",
        "The session is active.",
        SessionStatus {
            logged_in: true,
            user: Some(user),
        },
    ))
}
