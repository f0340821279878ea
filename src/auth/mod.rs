use crate::state::AppState;
use axum::Router;

mod cookie;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod keys;
pub mod password;
pub mod services;
pub mod session;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
