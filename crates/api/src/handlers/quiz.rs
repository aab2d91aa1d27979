use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use exam_core::model::QuestionId;
use services::{AnswerOutcome, AnswerView, FinishReport, QuestionView, QuizError, QuizSelection};

use crate::error::ApiError;
use crate::session::{session_key, session_key_or_new};
use crate::AppState;

/// Reserved count value meaning "every matching question, shuffled".
///
/// The numeric form is kept for compatibility with existing clients; the
/// literal `"all"` is the readable alias.
const ALL_SENTINEL: u32 = 295;

//
// ─── REQUEST / RESPONSE SHAPES ─────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub areas: Vec<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    pub count: CountField,
}

/// The quiz size, as a number or a string (`"10"`, `"295"`, `"all"`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CountField {
    Number(u32),
    Text(String),
}

impl CountField {
    fn into_selection(self) -> Result<QuizSelection, ApiError> {
        let number = match self {
            CountField::Number(n) => n,
            CountField::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.eq_ignore_ascii_case("all") {
                    return Ok(QuizSelection::All);
                }
                trimmed.parse::<u32>().map_err(|_| {
                    ApiError::validation(format!("invalid count: {raw:?}"))
                })?
            }
        };

        if number == ALL_SENTINEL {
            return Ok(QuizSelection::All);
        }
        if number == 0 {
            return Err(ApiError::validation("count must be positive"));
        }
        Ok(QuizSelection::Limit(number))
    }
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: u64,
    pub option: String,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub success: bool,
    pub session_id: String,
    pub total: usize,
    pub position: usize,
    pub question: QuestionView,
    pub previous_answer: Option<AnswerView>,
}

#[derive(Serialize)]
pub struct QuestionResponse {
    pub success: bool,
    pub total: usize,
    pub position: usize,
    pub question: QuestionView,
    pub previous_answer: Option<AnswerView>,
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub success: bool,
    pub correct: bool,
    pub correct_option: String,
    pub rationale: String,
}

#[derive(Serialize)]
pub struct FinishResponse {
    pub success: bool,
    pub report: FinishReport,
}

/// Empty issuer and the catch-all label both mean "no filter".
fn normalize_issuer(issuer: Option<String>) -> Option<String> {
    issuer.filter(|i| {
        let trimmed = i.trim();
        !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("todas")
    })
}

//
// ─── HANDLERS ──────────────────────────────────────────────────────────────────
//

pub async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let key = session_key_or_new(&headers);
    let selection = request.count.into_selection()?;
    let issuer = normalize_issuer(request.issuer);

    let step = state
        .services
        .quiz()
        .start(key, &request.areas, issuer.as_deref(), selection)
        .await?;

    Ok(Json(StartResponse {
        success: true,
        session_id: key.to_string(),
        total: step.total,
        position: step.position,
        question: step.question,
        previous_answer: step.previous_answer,
    }))
}

pub async fn question_at(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let key = session_key(&headers).ok_or_else(|| ApiError::from(QuizError::NoActiveSession))?;

    let step = state.services.quiz().question_at(key, index).await?;

    Ok(Json(QuestionResponse {
        success: true,
        total: step.total,
        position: step.position,
        question: step.question,
        previous_answer: step.previous_answer,
    }))
}

pub async fn answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let key = session_key(&headers).ok_or_else(|| ApiError::from(QuizError::NoActiveSession))?;

    let AnswerOutcome {
        correct,
        correct_option,
        rationale,
    } = state
        .services
        .quiz()
        .answer(key, QuestionId::new(request.question_id), &request.option)
        .await?;

    Ok(Json(AnswerResponse {
        success: true,
        correct,
        correct_option,
        rationale,
    }))
}

pub async fn finish(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FinishResponse>, ApiError> {
    let key = session_key(&headers).ok_or_else(|| ApiError::from(QuizError::NoActiveSession))?;

    let report = state.services.quiz().finish(key).await?;

    Ok(Json(FinishResponse {
        success: true,
        report,
    }))
}
