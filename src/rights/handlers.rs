use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{error::AppError, orders::services::validate_phone, state::AppState};

use super::dto::RightsQuery;
use super::ledger::{check_order_rights, RightsDecision};
use super::slots::{available_slots, SlotAvailability};

pub fn rights_routes() -> Router<AppState> {
    Router::new()
        .route("/order-rights", get(get_order_rights))
        .route("/order-slots", get(get_order_slots))
}

#[instrument(skip(state))]
pub async fn get_order_rights(
    State(state): State<AppState>,
    Query(q): Query<RightsQuery>,
) -> Result<Json<RightsDecision>, AppError> {
    let phone = validate_phone(&q.phone)?;
    if q.device_id.trim().is_empty() {
        return Err(AppError::Validation("deviceId is required".into()));
    }
    let decision = check_order_rights(
        state.store.as_ref(),
        &state.clock,
        state.config.locale,
        &phone,
        q.device_id.trim(),
    )
    .await?;
    Ok(Json(decision))
}

pub async fn get_order_slots(State(state): State<AppState>) -> Json<Vec<SlotAvailability>> {
    Json(available_slots(state.clock.hour()))
}
