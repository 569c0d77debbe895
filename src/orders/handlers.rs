use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::Date;
use tracing::instrument;

use crate::{clock::parse_date, error::AppError, state::AppState};

use super::dto::{CompletionSummary, DateQuery, OrderReadyNotice, PlaceOrderRequest, PlacedOrder};
use super::repo_types::{ActiveOrder, CompletedOrder};
use super::services;

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(place_order))
        .route("/orders/:id/complete", post(complete_order))
        .route("/active-orders", get(list_active_orders))
        .route("/completed-orders", get(list_completed_orders))
        .route("/ready-orders", get(list_ready_orders))
        .route("/ready-orders/:id/pickup", post(pick_up_order))
}

fn requested_date(q: &DateQuery) -> Result<Option<Date>, AppError> {
    q.date.as_deref().map(parse_date).transpose()
}

#[instrument(skip(state, body))]
pub async fn place_order(
    State(state): State<AppState>,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlacedOrder>), AppError> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let placed = services::place_order(&state, req).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

#[instrument(skip(state))]
pub async fn complete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CompletionSummary>, AppError> {
    Ok(Json(services::complete_order(&state, &id).await?))
}

pub async fn list_active_orders(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<ActiveOrder>>, AppError> {
    let date = requested_date(&q)?;
    Ok(Json(services::get_active_orders(&state, date).await?))
}

pub async fn list_completed_orders(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<CompletedOrder>>, AppError> {
    let date = requested_date(&q)?;
    Ok(Json(services::get_completed_orders(&state, date).await?))
}

pub async fn list_ready_orders(State(state): State<AppState>) -> Json<Vec<OrderReadyNotice>> {
    Json(state.board.list().await)
}

#[instrument(skip(state))]
pub async fn pick_up_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderReadyNotice>, AppError> {
    Ok(Json(state.board.pick_up(&id).await?))
}
