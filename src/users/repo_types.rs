use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::session::SessionUser;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub surname: String,
    pub given_name: String,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn session_view(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

/// What clients get to see of a user: no hash, no role.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub surname: String,
    pub given_name: String,
    pub handle: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            surname: u.surname,
            given_name: u.given_name,
            handle: u.handle,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Fields of a user about to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub surname: String,
    pub given_name: String,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_hash_and_role() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: 3,
            surname: "Doe".into(),
            given_name: "Jane".into(),
            handle: "jdoe".into(),
            email: "jane@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: ROLE_ADMIN.into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(PublicUser::from(user.clone())).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("role").is_none());
        assert_eq!(json["handle"], "jdoe");

        let view = user.session_view();
        assert_eq!(view.id, 3);
        assert!(view.is_admin());
    }
}
