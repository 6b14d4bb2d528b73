//! Brand list and per-domain report

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// GET /api/brands
///
/// `"All"` first, then the distinct brands of the merged view.
pub async fn list_brands(State(state): State<AppState>) -> Json<Vec<String>> {
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.brands())
}

#[derive(Debug, Serialize)]
pub struct DomainRow {
    pub hostname: String,
    pub count: usize,
    pub incomplete_count: usize,
    /// Identities of the records served from this hostname
    pub source_urls: Vec<String>,
}

/// GET /api/domains
///
/// Sorted by hostname. Records without a parsable URL are not listed.
pub async fn list_domains(State(state): State<AppState>) -> Json<Vec<DomainRow>> {
    let dashboard = state.dashboard.lock().await;

    let mut rows: Vec<DomainRow> = dashboard
        .domains()
        .into_iter()
        .map(|(hostname, stat)| DomainRow {
            hostname,
            count: stat.count,
            incomplete_count: stat.incomplete_count,
            source_urls: stat
                .records
                .iter()
                .map(|record| record.source_url().to_string())
                .collect(),
        })
        .collect();
    rows.sort_by(|a, b| a.hostname.cmp(&b.hostname));

    Json(rows)
}
