use axum::{
    extract::{Query, State},
    http::{header::ORIGIN, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use time::Duration;
use tracing::{debug, instrument, warn};
use validator::ValidateEmail;

use super::dto::{ChangePasswordRequest, ForgotPasswordRequest, ResetLinkData, ResetLinkQuery};
use crate::{
    auth::services as auth,
    error::{ApiError, ApiResult, FieldError},
    extract::ValidJson,
    mail::{reset_mail, reset_url},
    response::{message, Message},
    state::AppState,
    tokens::{ResetCode, TokenError},
    users::{self, repo_types::PublicUser},
};

pub fn password_routes() -> Router<AppState> {
    Router::new()
        .route("/password/forgot", post(request_password_reset))
        .route("/password/reset", get(confirm_reset_token).post(change_password))
}

#[instrument(skip(state, headers, payload))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<ForgotPasswordRequest>,
) -> ApiResult<Json<Message<()>>> {
    let email = payload.email.trim().to_lowercase();
    let ttl = Duration::minutes(state.config.reset.token_ttl_minutes);
    let token = state.tokens.issue(&email, ttl).await?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(state.config.reset.default_origin.as_str());
    let url = reset_url(origin, &state.config.reset.path, &token.code, &email);

    let mail = reset_mail(&state.config.mail, &state.reset_template, &email, &url);
    if let Err(e) = state.mailer.send(mail).await {
        // The link never left, so the email must stay free for a retry.
        match state.tokens.delete(&email).await {
            Ok(()) | Err(TokenError::NotFound) => {}
            Err(cleanup) => warn!(error = %cleanup, "unsent reset token left in place"),
        }
        return Err(ApiError::MailDelivery(e));
    }

    Ok(message(
        "reset token generated and mail sent",
        format!("You will receive an email at {email} to reset your password."),
        (),
    ))
}

#[instrument(skip(state, query))]
pub async fn confirm_reset_token(
    State(state): State<AppState>,
    Query(query): Query<ResetLinkQuery>,
) -> ApiResult<Json<Message<ResetLinkData>>> {
    let code = ResetCode::parse(&query.token).ok_or(ApiError::InvalidTokenFormat)?;
    let email = query.email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(ApiError::Validation(vec![FieldError {
            field: "email".into(),
            messages: vec!["The email is not valid.".into()],
        }]));
    }

    state.tokens.assert_valid(&email, &code).await?;
    Ok(message(
        "",
        "The link is valid, enter your old password and then the new one.",
        ResetLinkData { email, token: code },
    ))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ChangePasswordRequest>,
) -> ApiResult<Json<Message<PublicUser>>> {
    let email = payload.email.trim().to_lowercase();
    auth::login(&state.db, &state.hasher, &email, &payload.old_password).await?;
    auth::assert_passwords_match(&payload.password, &payload.confirm_password)?;

    let user = users::services::change_password(&state.db, &state.hasher, &email, &payload.password).await?;
    match state.tokens.delete(&email).await {
        Ok(()) | Err(TokenError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }
    debug!(user_id = user.id, "outstanding reset token cleared");

    Ok(message(
        &format!("user password updated ({})", user.id),
        "Your password was changed, you can now log in.",
        user.into(),
    ))
}
