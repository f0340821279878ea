use sqlx::PgPool;
use tracing::{info, instrument};

use super::{
    repo_types::{User, ROLE_ADMIN},
    services::{self, UserDraft, UserError, UserPatch},
};
use crate::{auth::password::Hasher, config::AdminConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPlan {
    Create,
    Promote(i64),
    Keep(i64),
}

/// An existing user keeps its password; only the role is raised.
pub fn plan(existing: Option<&User>) -> SeedPlan {
    match existing {
        None => SeedPlan::Create,
        Some(user) if user.role == ROLE_ADMIN => SeedPlan::Keep(user.id),
        Some(user) => SeedPlan::Promote(user.id),
    }
}

fn draft(cfg: &AdminConfig) -> UserDraft {
    UserDraft {
        surname: "Admin".into(),
        given_name: "Admin".into(),
        handle: cfg.handle.clone(),
        email: cfg.email.clone(),
        password: cfg.password.clone(),
        role: ROLE_ADMIN.to_string(),
    }
}

/// Makes sure the configured administrator exists, with its default account.
#[instrument(skip(db, hasher, cfg), fields(email = %cfg.email))]
pub async fn ensure_admin(db: &PgPool, hasher: &Hasher, cfg: &AdminConfig) -> Result<User, UserError> {
    let existing = User::find_by_email(db, &cfg.email).await?;
    match plan(existing.as_ref()) {
        SeedPlan::Create => {
            let user = services::create(db, hasher, draft(cfg)).await?;
            info!(user_id = user.id, "admin user created");
            Ok(user)
        }
        SeedPlan::Promote(id) => {
            let patch = UserPatch {
                role: Some(ROLE_ADMIN.to_string()),
                ..Default::default()
            };
            let user = services::update(db, hasher, id, patch).await?;
            info!(user_id = id, "existing user promoted to admin");
            Ok(user)
        }
        SeedPlan::Keep(id) => {
            info!(user_id = id, "admin user already present");
            existing.ok_or(UserError::NotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(role: &str) -> User {
        User {
            id: 7,
            surname: "Doe".into(),
            given_name: "Jane".into(),
            handle: "jdoe".into(),
            email: "root@blogd.io".into(),
            password_hash: "$argon2id$stub".into(),
            role: role.into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn missing_admin_is_created() {
        assert_eq!(plan(None), SeedPlan::Create);
    }

    #[test]
    fn plain_user_is_promoted() {
        assert_eq!(plan(Some(&user("user"))), SeedPlan::Promote(7));
    }

    #[test]
    fn existing_admin_is_kept() {
        assert_eq!(plan(Some(&user("admin"))), SeedPlan::Keep(7));
    }

    #[test]
    fn draft_carries_admin_role_and_config() {
        let cfg = AdminConfig {
            email: "root@blogd.io".into(),
            password: "hunter22".into(),
            handle: "root".into(),
        };
        let d = draft(&cfg);
        assert_eq!(d.role, ROLE_ADMIN);
        assert_eq!(d.email, "root@blogd.io");
        assert_eq!(d.handle, "root");
        assert_eq!(d.password, "hunter22");
    }
}
