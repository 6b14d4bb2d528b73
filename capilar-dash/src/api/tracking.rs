//! Harvest-progress tab

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use capilar_common::tracking::{StatusFilter, TrackingSummary};
use capilar_common::TrackingEntry;
use serde::Serialize;

use crate::api::ApiError;
use crate::pagination::{calculate_pagination, PageQuery, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub summary: TrackingSummary,
    /// Brands the harvester was asked to cover
    pub total_brands: u64,
    pub status_filter: StatusFilter,
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub entries: Vec<TrackingEntry>,
}

/// GET /api/tracking?page=N
///
/// Summary covers every entry; the list honours the status filter.
pub async fn list_tracking(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let Query(query) = query?;
    let dashboard = state.dashboard.lock().await;

    let filtered = dashboard.filtered_tracking();
    let total_results = filtered.len() as i64;
    let p = calculate_pagination(total_results, query.page);

    Ok(Json(TrackingResponse {
        summary: dashboard.tracking_summary(),
        total_brands: dashboard.tracking().total_brands,
        status_filter: dashboard.tracking_filter().clone(),
        total_results,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        entries: p.slice(&filtered).iter().map(|entry| (*entry).clone()).collect(),
    }))
}
