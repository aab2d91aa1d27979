use axum::Json;
use axum::extract::State;
use serde::Serialize;

use services::{AreaStats, OverallStats, RecentResult};

use crate::{AppState, error::ApiError};

#[derive(Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub overall: OverallStats,
    pub areas: Vec<AreaStats>,
    pub recent: Vec<RecentResult>,
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let dashboard = state.services.stats().dashboard().await?;
    Ok(Json(StatsResponse {
        success: true,
        overall: dashboard.overall,
        areas: dashboard.areas,
        recent: dashboard.recent,
    }))
}
