use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    password::Hasher,
    session::{SessionData, SessionUser},
};
use crate::users::repo_types::User;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no user registered with this email")]
    UserNotFound,
    #[error("password does not match")]
    PasswordMismatch,
    #[error("session already holds a user")]
    AlreadyActiveSession,
    #[error("passwords are not equal")]
    PasswordsNotEqual,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Checks `password` against the stored hash of `user`, if there is one.
pub fn verify_credentials(
    hasher: &Hasher,
    user: Option<User>,
    password: &str,
) -> Result<User, AuthError> {
    let user = user.ok_or(AuthError::UserNotFound)?;
    if !hasher.verify(password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AuthError::PasswordMismatch);
    }
    Ok(user)
}

pub async fn login(db: &PgPool, hasher: &Hasher, email: &str, password: &str) -> Result<User, AuthError> {
    let user = User::find_by_email(db, email).await?;
    if user.is_none() {
        debug!("login unknown email");
    }
    verify_credentials(hasher, user, password)
}

/// Stores `view` in an empty session. A session that already holds a user is left untouched.
pub fn set_session(session: &SessionData, view: SessionUser) -> Result<SessionData, AuthError> {
    if session.user.is_some() {
        return Err(AuthError::AlreadyActiveSession);
    }
    Ok(SessionData { user: Some(view) })
}

pub fn assert_passwords_match(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password != confirm {
        return Err(AuthError::PasswordsNotEqual);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_hasher;
    use time::OffsetDateTime;

    fn stored_user(hasher: &Hasher, password: &str) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: 7,
            surname: "Doe".into(),
            given_name: "Jane".into(),
            handle: "jdoe".into(),
            email: "jane@example.com".into(),
            password_hash: hasher.hash(password).unwrap(),
            role: "user".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn view() -> SessionUser {
        SessionUser {
            id: 7,
            email: "jane@example.com".into(),
            role: "user".into(),
        }
    }

    #[test]
    fn credentials_verify_for_right_password() {
        let hasher = test_hasher();
        let user = stored_user(&hasher, "pa55word");
        let logged = verify_credentials(&hasher, Some(user), "pa55word").unwrap();
        assert_eq!(logged.id, 7);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let err = verify_credentials(&test_hasher(), None, "whatever").unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[test]
    fn wrong_password_is_mismatch() {
        let hasher = test_hasher();
        let user = stored_user(&hasher, "pa55word");
        let err = verify_credentials(&hasher, Some(user), "pa55w0rd").unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
    }

    #[test]
    fn corrupt_hash_is_a_storage_error() {
        let hasher = test_hasher();
        let mut user = stored_user(&hasher, "pa55word");
        user.password_hash = "garbage".into();
        let err = verify_credentials(&hasher, Some(user), "pa55word").unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));
    }

    #[test]
    fn set_session_stores_exactly_the_view() {
        let data = set_session(&SessionData::default(), view()).unwrap();
        assert_eq!(data.user, Some(view()));
    }

    #[test]
    fn set_session_refuses_active_session() {
        let active = SessionData { user: Some(view()) };
        let other = SessionUser {
            id: 8,
            ..view()
        };
        let err = set_session(&active, other).unwrap_err();
        assert!(matches!(err, AuthError::AlreadyActiveSession));
    }

    #[test]
    fn passwords_must_be_equal() {
        assert!(assert_passwords_match("abcd", "abcd").is_ok());
        assert!(matches!(
            assert_passwords_match("abcd", "abce"),
            Err(AuthError::PasswordsNotEqual)
        ));
    }
}
