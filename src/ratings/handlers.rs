use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};

use crate::{error::AppError, state::AppState};

use super::{get_item_ratings, RatingSummary};

pub fn rating_routes() -> Router<AppState> {
    Router::new().route("/item-ratings", get(list_item_ratings))
}

pub async fn list_item_ratings(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, RatingSummary>>, AppError> {
    Ok(Json(get_item_ratings(state.store.as_ref()).await?))
}
