//! View state and operator intents
//!
//! The presentation layer forwards each operator action as one intent and
//! re-renders from the returned view state.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use capilar_common::dashboard::ViewState;
use capilar_common::{Intent, IntentOutcome};
use serde::Serialize;

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    #[serde(flatten)]
    pub outcome: IntentOutcome,
    pub state: ViewState,
}

/// GET /api/state
pub async fn get_state(State(state): State<AppState>) -> Json<ViewState> {
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.view_state())
}

/// POST /api/intents
///
/// Body: `{"action": "<intent>", ...fields}`
pub async fn post_intent(
    State(state): State<AppState>,
    payload: Result<Json<Intent>, JsonRejection>,
) -> Result<Json<IntentResponse>, ApiError> {
    let Json(intent) = payload?;
    let mut dashboard = state.dashboard.lock().await;
    let outcome = dashboard.apply(intent)?;
    Ok(Json(IntentResponse {
        outcome,
        state: dashboard.view_state(),
    }))
}
