//! Snapshot download

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::api::ApiError;
use crate::AppState;

/// GET /api/export
///
/// The merged view as a JSON attachment named after today's date.
pub async fn export_snapshot(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = {
        let dashboard = state.dashboard.lock().await;
        dashboard.export_snapshot()?
    };

    let disposition = format!("attachment; filename=\"{}\"", snapshot.suggested_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        snapshot.bytes,
    )
        .into_response())
}
