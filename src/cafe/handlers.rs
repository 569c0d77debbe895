use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{error::AppError, state::AppState};

use super::dto::{CafeStatusUpdate, StockUpdate};
use super::repo_types::CafeStatus;

pub fn cafe_routes() -> Router<AppState> {
    Router::new()
        .route("/cafe-status", get(get_cafe_status).put(put_cafe_status))
        .route("/stock-status", get(get_stock_status).put(put_stock_status))
}

pub async fn get_cafe_status(State(state): State<AppState>) -> Json<CafeStatus> {
    Json(state.cafe.status().await)
}

#[instrument(skip(state))]
pub async fn put_cafe_status(
    State(state): State<AppState>,
    Json(update): Json<CafeStatusUpdate>,
) -> Result<Json<CafeStatus>, AppError> {
    let status = state.cafe.update_status(update).await?;
    Ok(Json(status))
}

pub async fn get_stock_status(State(state): State<AppState>) -> Json<BTreeMap<String, bool>> {
    Json(state.cafe.stock().await)
}

#[instrument(skip(state))]
pub async fn put_stock_status(
    State(state): State<AppState>,
    Json(update): Json<StockUpdate>,
) -> Result<Json<BTreeMap<String, bool>>, AppError> {
    let item = update.item_name.trim();
    if item.is_empty() {
        return Err(AppError::Validation("itemName is required".into()));
    }
    state.cafe.set_stock(item, update.is_available).await?;
    Ok(Json(state.cafe.stock().await))
}
