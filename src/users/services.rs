use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use super::repo_types::{NewUser, User, UserChanges};
use crate::{accounts::Account, auth::password::Hasher};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(i64),
    #[error("no user registered with this email")]
    EmailNotRegistered,
    #[error("email already in use")]
    EmailTaken,
    #[error("handle already in use")]
    HandleTaken,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Plain-text input for a new user.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub surname: String,
    pub given_name: String,
    pub handle: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Partial plain-text update.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Maps a violated unique constraint of `users` to its domain error.
fn conflict_for(e: &sqlx::Error) -> Option<UserError> {
    let sqlx::Error::Database(db) = e else {
        return None;
    };
    if !db.is_unique_violation() {
        return None;
    }
    match db.constraint() {
        Some("users_email_key") => Some(UserError::EmailTaken),
        Some("users_handle_key") => Some(UserError::HandleTaken),
        _ => None,
    }
}

fn storage(e: sqlx::Error) -> UserError {
    conflict_for(&e).unwrap_or_else(|| UserError::Storage(e.into()))
}

pub async fn list(db: &PgPool) -> Result<Vec<User>, UserError> {
    Ok(User::list(db).await?)
}

pub async fn get(db: &PgPool, id: i64) -> Result<User, UserError> {
    User::find_by_id(db, id).await?.ok_or(UserError::NotFound(id))
}

/// Inserts the user and its default account in one transaction.
pub async fn create(db: &PgPool, hasher: &Hasher, draft: UserDraft) -> Result<User, UserError> {
    if User::email_taken(db, &draft.email, None).await? {
        return Err(UserError::EmailTaken);
    }
    if User::handle_taken(db, &draft.handle, None).await? {
        return Err(UserError::HandleTaken);
    }

    let new = NewUser {
        password_hash: hasher.hash(&draft.password)?,
        surname: draft.surname,
        given_name: draft.given_name,
        handle: draft.handle,
        email: draft.email,
        role: draft.role,
    };

    let mut tx = db.begin().await.map_err(storage)?;
    let user = User::insert(&mut *tx, &new).await.map_err(storage)?;
    let account = Account::create_default(&mut *tx, user.id).await.map_err(storage)?;
    tx.commit().await.map_err(storage)?;

    info!(user_id = user.id, account_id = account.id, "user created");
    Ok(user)
}

pub async fn update(db: &PgPool, hasher: &Hasher, id: i64, patch: UserPatch) -> Result<User, UserError> {
    if !User::exists(db, id).await? {
        return Err(UserError::NotFound(id));
    }
    if let Some(email) = &patch.email {
        if User::email_taken(db, email, Some(id)).await? {
            return Err(UserError::EmailTaken);
        }
    }
    if let Some(handle) = &patch.handle {
        if User::handle_taken(db, handle, Some(id)).await? {
            return Err(UserError::HandleTaken);
        }
    }

    let password_hash = match &patch.password {
        Some(plain) => Some(hasher.hash(plain)?),
        None => None,
    };
    let changes = UserChanges {
        surname: patch.surname,
        given_name: patch.given_name,
        handle: patch.handle,
        email: patch.email,
        password_hash,
        role: patch.role,
    };

    let user = User::update(db, id, &changes)
        .await
        .map_err(storage)?
        .ok_or(UserError::NotFound(id))?;
    info!(user_id = id, password_changed = changes.password_hash.is_some(), "user updated");
    Ok(user)
}

/// Re-hashes and stores the password of the user registered with `email`.
pub async fn change_password(
    db: &PgPool,
    hasher: &Hasher,
    email: &str,
    password: &str,
) -> Result<User, UserError> {
    let hash = hasher.hash(password)?;
    match User::update_password_by_email(db, email, &hash).await? {
        Some(user) => {
            info!(user_id = user.id, "user password changed");
            Ok(user)
        }
        None => {
            warn!("password change for a vanished user");
            Err(UserError::EmailNotRegistered)
        }
    }
}

pub async fn delete(db: &PgPool, id: i64) -> Result<(), UserError> {
    if !User::exists(db, id).await? {
        return Err(UserError::NotFound(id));
    }
    match User::delete(db, id).await? {
        0 => Err(UserError::NotFound(id)),
        _ => {
            info!(user_id = id, "user deleted");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_conflicts() {
        assert!(conflict_for(&sqlx::Error::RowNotFound).is_none());
        assert!(matches!(storage(sqlx::Error::PoolTimedOut), UserError::Storage(_)));
    }
}
