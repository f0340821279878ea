use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    repo_types::PublicUser,
    services::{self, UserPatch},
};
use crate::{
    auth::extractors::CurrentUser,
    error::{ApiError, ApiResult},
    extract::{IdPath, ValidJson},
    posts::{self, repo_types::Post},
    response::{message, Message},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/posts", get(list_user_posts))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Message<Vec<PublicUser>>>> {
    let users = services::list(&state.db).await?;
    Ok(message(
        "",
        "Users loaded.",
        users.into_iter().map(PublicUser::from).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Message<PublicUser>>> {
    let user = services::get(&state.db, id).await?;
    Ok(message("", "User loaded.", user.into()))
}

#[instrument(skip(state, caller, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> ApiResult<Json<Message<PublicUser>>> {
    caller.ensure_admin()?;
    let user = services::create(&state.db, &state.hasher, payload.into()).await?;
    Ok(message(
        &format!("user created by admin ({})", user.id),
        "The user was created.",
        user.into(),
    ))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    IdPath(id): IdPath,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> ApiResult<Json<Message<PublicUser>>> {
    caller.ensure_can_act_for(id)?;
    let patch = UserPatch::from(payload);
    if patch.role.is_some() {
        caller.ensure_admin()?;
    }
    let user = services::update(&state.db, &state.hasher, id, patch).await?;
    Ok(message(
        &format!("user updated ({id})"),
        "The user was updated.",
        user.into(),
    ))
}

#[instrument(skip(state, caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<Message<()>>> {
    caller.ensure_can_act_for(id)?;
    services::delete(&state.db, id).await?;
    info!(user_id = id, by = caller.0.id, "user removed");
    Ok(message(&format!("user deleted ({id})"), "The user was deleted.", ()))
}

#[instrument(skip(state))]
pub async fn list_user_posts(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Message<Vec<Post>>>> {
    let posts = posts::services::list_by_author(&state.db, id).await?;
    if posts.is_empty() && !super::repo_types::User::exists(&state.db, id).await? {
        return Err(ApiError::from(services::UserError::NotFound(id)));
    }
    Ok(message("", "Posts of the user loaded.", posts))
}
