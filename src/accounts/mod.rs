mod handlers;
mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo_types::Account;

pub fn router() -> Router<AppState> {
    handlers::account_routes()
}
