use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    auth::services::AuthError, posts::services::PostError, response::Message,
    tokens::TokenError, users::services::UserError,
};

/// One invalid field of a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Boundary error: every variant maps to one status and one client message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The submitted data is invalid.")]
    Validation(Vec<FieldError>),

    #[error("The request body could not be read: {0}")]
    MalformedBody(String),

    #[error("`{0}` is not a valid id, ids are positive integers.")]
    InvalidId(String),

    #[error("The password reset token is not in the expected format.")]
    InvalidTokenFormat,

    #[error("Both passwords must match.")]
    PasswordsNotEqual,

    #[error("The email or password is incorrect.")]
    InvalidCredentials,

    #[error("The token is expired or invalid.")]
    TokenExpiredOrInvalid,

    #[error("No active session.")]
    NoActiveSession,

    #[error("You are not allowed to perform this action.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("This email is already used, if you already have an account you can log in.")]
    EmailTaken,

    #[error("This handle is already used.")]
    HandleTaken,

    #[error("You are already logged in.")]
    AlreadyActiveSession,

    #[error("A password reset was already requested for this email, check your inbox.")]
    ResetAlreadyRequested,

    #[error("An error occurred while sending the email for your request.")]
    MailDelivery(#[source] anyhow::Error),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::MalformedBody(_)
            | Self::InvalidId(_)
            | Self::InvalidTokenFormat
            | Self::PasswordsNotEqual => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::TokenExpiredOrInvalid | Self::NoActiveSession => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::EmailTaken
            | Self::HandleTaken
            | Self::AlreadyActiveSession
            | Self::ResetAlreadyRequested => StatusCode::CONFLICT,
            Self::MailDelivery(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => {
                "An error occurred, try again later or contact an administrator.".to_string()
            }
            other => other.to_string(),
        }
    }

    fn data(&self) -> Value {
        match self {
            Self::Validation(fields) => json!(fields),
            Self::NoActiveSession => json!({ "loggedIn": false }),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Internal(e) | Self::MailDelivery(e) => {
                error!(%status, error = %format!("{e:#}"), "request failed")
            }
            other => warn!(%status, error = %other, "request rejected"),
        }
        let body = Message {
            message: self.public_message(),
            data: self.data(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| FieldError {
                field: field.to_string(),
                messages: errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("failed `{}` check", e.code))
                    })
                    .collect(),
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Self::Validation(fields)
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::ExpiredOrInvalid => Self::TokenExpiredOrInvalid,
            TokenError::AlreadyRequested => Self::ResetAlreadyRequested,
            TokenError::NotFound => Self::not_found("No password reset request exists for this email."),
            TokenError::Storage(e) => Self::Internal(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::UserNotFound | AuthError::PasswordMismatch => Self::InvalidCredentials,
            AuthError::AlreadyActiveSession => Self::AlreadyActiveSession,
            AuthError::PasswordsNotEqual => Self::PasswordsNotEqual,
            AuthError::Storage(e) => Self::Internal(e),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(id) => Self::not_found(format!("User {id} was not found.")),
            UserError::EmailNotRegistered => Self::not_found("No user is registered with this email."),
            UserError::EmailTaken => Self::EmailTaken,
            UserError::HandleTaken => Self::HandleTaken,
            UserError::Storage(e) => Self::Internal(e),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(e: PostError) -> Self {
        match e {
            PostError::NotFound(id) => Self::not_found(format!("Post {id} was not found.")),
            PostError::AuthorNotFound(id) => {
                Self::not_found(format!("User {id} does not exist, the post was not created."))
            }
            PostError::Storage(e) => Self::Internal(e),
        }
    }
}
