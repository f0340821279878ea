use serde::{Deserialize, Serialize};
use validator::Validate;

use super::session::SessionUser;
use crate::users::{repo_types::ROLE_USER, services::UserDraft};

/// Request body for registration. New accounts always get the `user` role.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "The surname must be 1 to 50 characters long."))]
    pub surname: String,
    #[validate(length(min = 2, max = 50, message = "The given name must be 2 to 50 characters long."))]
    pub given_name: String,
    #[validate(length(min = 2, max = 16, message = "The handle must be 2 to 16 characters long."))]
    pub handle: String,
    #[validate(
        email(message = "The email is not valid."),
        length(min = 5, max = 255, message = "The email must be 5 to 255 characters long.")
    )]
    pub email: String,
    #[validate(length(min = 4, max = 255, message = "The password must be 4 to 255 characters long."))]
    pub password: String,
}

impl From<RegisterRequest> for UserDraft {
    fn from(req: RegisterRequest) -> Self {
        Self {
            surname: req.surname.trim().to_string(),
            given_name: req.given_name.trim().to_string(),
            handle: req.handle.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            password: req.password,
            role: ROLE_USER.to_string(),
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "The email is not valid."))]
    pub email: String,
    #[validate(length(min = 4, message = "The password must be at least 4 characters long."))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}
