use axum::Json;
use axum::extract::State;
use serde::Serialize;

use services::{AreaSummary, IssuerSummary};

use crate::{AppState, error::ApiError};

#[derive(Serialize)]
pub struct AreasResponse {
    pub success: bool,
    pub areas: Vec<AreaSummary>,
}

#[derive(Serialize)]
pub struct IssuersResponse {
    pub success: bool,
    pub issuers: Vec<IssuerSummary>,
}

pub async fn list_areas(State(state): State<AppState>) -> Result<Json<AreasResponse>, ApiError> {
    let areas = state.services.catalog().list_areas().await?;
    Ok(Json(AreasResponse {
        success: true,
        areas,
    }))
}

pub async fn list_issuers(
    State(state): State<AppState>,
) -> Result<Json<IssuersResponse>, ApiError> {
    let issuers = state.services.catalog().list_issuers().await?;
    Ok(Json(IssuersResponse {
        success: true,
        issuers,
    }))
}
