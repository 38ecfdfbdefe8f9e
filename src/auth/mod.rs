use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::login_routes()
}
