use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::tokens::ResetCode;

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "The email is not valid."))]
    pub email: String,
}

/// Query of the link sent by mail. Both values are optional so that a missing
/// token is reported like a malformed one.
#[derive(Debug, Default, Deserialize)]
pub struct ResetLinkQuery {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetLinkData {
    pub email: String,
    pub token: ResetCode,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(email(message = "The email is not valid."))]
    pub email: String,
    #[validate(length(min = 4, message = "The old password must be at least 4 characters long."))]
    pub old_password: String,
    #[validate(length(min = 4, max = 255, message = "The password must be 4 to 255 characters long."))]
    pub password: String,
    #[validate(length(min = 4, max = 255, message = "The confirmation must be 4 to 255 characters long."))]
    pub confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_request_checks_every_field() {
        let req = ChangePasswordRequest {
            email: "nope".into(),
            old_password: "abc".into(),
            password: "abc".into(),
            confirm_password: "abc".into(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 4);
    }

    #[test]
    fn link_query_tolerates_missing_values() {
        let q: ResetLinkQuery = serde_json::from_str("{}").unwrap();
        assert!(q.token.is_empty());
        assert!(q.email.is_empty());
    }
}
