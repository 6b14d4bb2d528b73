//! Product list for the grid and table views

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use capilar_common::completeness::{completion_percent, is_incomplete, status_class, StatusClass};
use capilar_common::domains::hostname_label;
use capilar_common::MergedRecord;
use serde::Serialize;

use crate::api::ApiError;
use crate::pagination::{calculate_pagination, PageQuery, PAGE_SIZE};
use crate::AppState;

/// One merged record with its derived display attributes
#[derive(Debug, Serialize)]
pub struct ProductRow {
    pub status: StatusClass,
    pub completion: u8,
    pub hostname: String,
    pub incomplete: bool,
    pub record: MergedRecord,
}

impl ProductRow {
    pub fn new(record: &MergedRecord) -> Self {
        Self {
            status: status_class(record),
            completion: completion_percent(record),
            hostname: hostname_label(record.source_url()),
            incomplete: is_incomplete(record),
            record: record.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub total_results: i64,
    /// Incomplete records across the whole merged view, not just this page
    pub incomplete_count: usize,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub rows: Vec<ProductRow>,
}

/// GET /api/products?page=N
///
/// Results of the current product query, in harvest order.
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let Query(query) = query?;
    let dashboard = state.dashboard.lock().await;

    let results = dashboard.filtered();
    let total_results = results.len() as i64;
    let p = calculate_pagination(total_results, query.page);

    let rows = p
        .slice(&results)
        .iter()
        .map(|record| ProductRow::new(record))
        .collect();

    Ok(Json(ProductsResponse {
        total_results,
        incomplete_count: dashboard.incomplete_count(),
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        rows,
    }))
}
