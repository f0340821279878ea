use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{CreatePostRequest, UpdatePostRequest},
    repo_types::Post,
    services,
};
use crate::{
    auth::extractors::CurrentUser,
    error::ApiResult,
    extract::{IdPath, ValidJson},
    response::{message, Message},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/published", get(list_published_posts))
        .route("/posts/:id", get(get_post))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", axum::routing::post(create_post))
        .route("/posts/:id", axum::routing::put(update_post).delete(delete_post))
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Message<Vec<Post>>>> {
    let posts = services::list(&state.db).await?;
    Ok(message("", "Posts loaded.", posts))
}

#[instrument(skip(state))]
pub async fn list_published_posts(State(state): State<AppState>) -> ApiResult<Json<Message<Vec<Post>>>> {
    let posts = services::list_published(&state.db).await?;
    Ok(message("", "Published posts loaded.", posts))
}

#[instrument(skip(state))]
pub async fn get_post(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Json<Message<Post>>> {
    let post = services::get(&state.db, id).await?;
    Ok(message("", "Post loaded.", post))
}

#[instrument(skip(state, caller, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    caller: CurrentUser,
    ValidJson(payload): ValidJson<CreatePostRequest>,
) -> ApiResult<Json<Message<Post>>> {
    caller.ensure_can_act_for(payload.author_id)?;
    let post = services::create(&state.db, payload.into()).await?;
    Ok(message(
        &format!("post created ({}) by user ({})", post.id, post.author_id),
        "The post was created.",
        post,
    ))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    caller: CurrentUser,
    IdPath(id): IdPath,
    ValidJson(payload): ValidJson<UpdatePostRequest>,
) -> ApiResult<Json<Message<Post>>> {
    let existing = services::get(&state.db, id).await?;
    caller.ensure_can_act_for(existing.author_id)?;
    let post = services::update(&state.db, id, payload.into()).await?;
    Ok(message(&format!("post updated ({id})"), "The post was updated.", post))
}

#[instrument(skip(state, caller))]
pub async fn delete_post(
    State(state): State<AppState>,
    caller: CurrentUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<Message<()>>> {
    let existing = services::get(&state.db, id).await?;
    caller.ensure_can_act_for(existing.author_id)?;
    services::delete(&state.db, id).await?;
    Ok(message(&format!("post deleted ({id})"), "The post was deleted.", ()))
}
