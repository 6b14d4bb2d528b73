//! Detail view of the selected record

use axum::{extract::State, Json};
use capilar_common::completeness::{completion_percent, empty_fields, status_class, StatusClass};
use capilar_common::session::SessionState;
use capilar_common::{EditableField, MergedRecord};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub selected: Option<SelectedRecord>,
    pub session: SessionState,
}

#[derive(Debug, Serialize)]
pub struct SelectedRecord {
    pub record: MergedRecord,
    pub status: StatusClass,
    pub completion: u8,
    /// Value shown per editable field (buffered edit if editing, else merged)
    pub values: BTreeMap<EditableField, Option<String>>,
    /// Blank editable fields, flagged in the form
    pub empty_fields: Vec<EditableField>,
    /// Claim flags, display only
    pub claims: Vec<String>,
}

/// GET /api/detail
pub async fn get_detail(State(state): State<AppState>) -> Json<DetailResponse> {
    let dashboard = state.dashboard.lock().await;
    let session = dashboard.session();

    let selected = session.selected().map(|record| SelectedRecord {
        status: status_class(record),
        completion: completion_percent(record),
        values: EditableField::ALL
            .into_iter()
            .map(|field| (field, session.pending_value(field).map(str::to_string)))
            .collect(),
        empty_fields: empty_fields(record),
        claims: record
            .record
            .active_claims()
            .into_iter()
            .map(str::to_string)
            .collect(),
        record: record.clone(),
    });

    Json(DetailResponse {
        selected,
        session: session.state().clone(),
    })
}
