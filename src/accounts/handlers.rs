use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::repo_types::Account;
use crate::{
    error::{ApiError, ApiResult},
    extract::IdPath,
    response::{message, Message},
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/:id", get(get_account))
}

#[instrument(skip(state))]
pub async fn list_accounts(State(state): State<AppState>) -> ApiResult<Json<Message<Vec<Account>>>> {
    let accounts = Account::list(&state.db).await?;
    Ok(message("", "Accounts loaded.", accounts))
}

#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Message<Account>>> {
    let account = Account::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account {id} was not found.")))?;
    Ok(message("", "Account loaded.", account))
}
