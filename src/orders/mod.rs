pub mod board;
pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod sequencer;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use board::ReadyBoard;

pub fn router() -> Router<AppState> {
    handlers::order_routes()
}
