pub mod cache;
pub mod dto;
pub mod handlers;
pub mod repo_types;

pub use cache::CafeCache;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::cafe_routes()
}
