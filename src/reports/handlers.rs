use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{clock::parse_date, error::AppError, state::AppState};

use super::dto::ReportQuery;
use super::{get_reports, ReportFilter, ReportResult};

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/reports", get(reports))
}

#[instrument(skip(state))]
pub async fn reports(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<Json<ReportResult>, AppError> {
    let filter = match q.filter.as_deref() {
        Some(raw) => raw.parse::<ReportFilter>()?,
        None => ReportFilter::default(),
    };
    let start = q.start_date.as_deref().map(parse_date).transpose()?;
    let end = q.end_date.as_deref().map(parse_date).transpose()?;
    let report = get_reports(state.store.as_ref(), &state.clock, filter, start, end).await?;
    Ok(Json(report))
}
