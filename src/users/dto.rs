use serde::Deserialize;
use validator::Validate;

use super::{
    repo_types::ROLE_USER,
    services::{UserDraft, UserPatch},
};

/// Request body for `POST /users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
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
    #[validate(length(max = 255, message = "The role must be at most 255 characters long."))]
    pub role: Option<String>,
}

impl From<CreateUserRequest> for UserDraft {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            surname: req.surname.trim().to_string(),
            given_name: req.given_name.trim().to_string(),
            handle: req.handle.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            password: req.password,
            role: req.role.unwrap_or_else(|| ROLE_USER.to_string()),
        }
    }
}

/// Request body for `PUT /users/:id`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50, message = "The surname must be 1 to 50 characters long."))]
    pub surname: Option<String>,
    #[validate(length(min = 2, max = 50, message = "The given name must be 2 to 50 characters long."))]
    pub given_name: Option<String>,
    #[validate(length(min = 2, max = 16, message = "The handle must be 2 to 16 characters long."))]
    pub handle: Option<String>,
    #[validate(
        email(message = "The email is not valid."),
        length(min = 5, max = 255, message = "The email must be 5 to 255 characters long.")
    )]
    pub email: Option<String>,
    #[validate(length(min = 4, max = 255, message = "The password must be 4 to 255 characters long."))]
    pub password: Option<String>,
    #[validate(length(max = 255, message = "The role must be at most 255 characters long."))]
    pub role: Option<String>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            surname: req.surname.map(|s| s.trim().to_string()),
            given_name: req.given_name.map(|s| s.trim().to_string()),
            handle: req.handle.map(|s| s.trim().to_string()),
            email: req.email.map(|s| s.trim().to_lowercase()),
            password: req.password,
            role: req.role,
        }
    }
}
