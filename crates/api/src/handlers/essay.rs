use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use services::{EssayReview, EssayTopic};

use crate::{AppState, error::ApiError};

#[derive(Serialize)]
pub struct TopicsResponse {
    pub success: bool,
    pub topics: &'static [EssayTopic],
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub topic: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct GradeResponse {
    pub success: bool,
    pub review: EssayReview,
}

pub async fn topics(State(state): State<AppState>) -> Json<TopicsResponse> {
    Json(TopicsResponse {
        success: true,
        topics: state.services.essay().topics(),
    })
}

pub async fn grade(
    State(state): State<AppState>,
    Json(request): Json<GradeRequest>,
) -> Result<Json<GradeResponse>, ApiError> {
    let review = state
        .services
        .essay()
        .grade(&request.topic, &request.text)
        .await?;

    Ok(Json(GradeResponse {
        success: true,
        review,
    }))
}
