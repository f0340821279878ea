use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use super::repo_types::{NewPost, Post, PostChanges};
use crate::users::repo_types::User;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post {0} not found")]
    NotFound(i64),
    #[error("author {0} does not exist")]
    AuthorNotFound(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub async fn list(db: &PgPool) -> Result<Vec<Post>, PostError> {
    Ok(Post::list(db).await?)
}

pub async fn list_published(db: &PgPool) -> Result<Vec<Post>, PostError> {
    Ok(Post::list_published(db).await?)
}

pub async fn list_by_author(db: &PgPool, author_id: i64) -> Result<Vec<Post>, PostError> {
    Ok(Post::list_by_author(db, author_id).await?)
}

pub async fn get(db: &PgPool, id: i64) -> Result<Post, PostError> {
    Post::find(db, id).await?.ok_or(PostError::NotFound(id))
}

pub async fn create(db: &PgPool, new: NewPost) -> Result<Post, PostError> {
    if !User::exists(db, new.author_id).await? {
        return Err(PostError::AuthorNotFound(new.author_id));
    }
    let post = Post::insert(db, &new).await?;
    info!(post_id = post.id, author_id = post.author_id, "post created");
    Ok(post)
}

pub async fn update(db: &PgPool, id: i64, changes: PostChanges) -> Result<Post, PostError> {
    let post = Post::update(db, id, &changes)
        .await?
        .ok_or(PostError::NotFound(id))?;
    info!(post_id = id, "post updated");
    Ok(post)
}

pub async fn delete(db: &PgPool, id: i64) -> Result<(), PostError> {
    match Post::delete(db, id).await? {
        0 => Err(PostError::NotFound(id)),
        _ => {
            info!(post_id = id, "post deleted");
            Ok(())
        }
    }
}
