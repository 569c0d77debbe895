mod dto;
pub mod handlers;
pub mod ledger;
pub mod repo_types;
pub mod slots;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::rights_routes()
}
