use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use exam_core::model::AreaCatalog;
use storage::repository::{QuestionRepository, ResultRepository};

use crate::error::StatsError;

const RECENT_RESULTS: u32 = 5;

//
// ─── DASHBOARD SHAPES ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestResult {
    pub recorded_at: DateTime<Utc>,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub question_bank: u64,
    pub quizzes_finished: u64,
    pub mean_accuracy: f64,
    pub total_correct: u64,
    pub total_attempted: u64,
    pub best: Option<BestResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaStats {
    pub area: String,
    pub question_count: u64,
    pub correct: u64,
    pub attempted: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentResult {
    pub id: u64,
    pub recorded_at: DateTime<Utc>,
    pub total: u32,
    pub correct: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub overall: OverallStats,
    pub areas: Vec<AreaStats>,
    pub recent: Vec<RecentResult>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//
// ─── STATS SERVICE ─────────────────────────────────────────────────────────────
//

/// Read-only dashboard aggregation over the question bank and stored results.
pub struct StatsService {
    catalog: Arc<AreaCatalog>,
    questions: Arc<dyn QuestionRepository>,
    results: Arc<dyn ResultRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        catalog: Arc<AreaCatalog>,
        questions: Arc<dyn QuestionRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            catalog,
            questions,
            results,
        }
    }

    /// Computes the full dashboard in one pass.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on repository failures.
    pub async fn dashboard(&self) -> Result<Dashboard, StatsError> {
        let question_bank = self.questions.count_all().await?;
        let totals = self.results.overall_totals().await?;
        let best = self.results.best_result().await?.map(|row| BestResult {
            recorded_at: row.result.recorded_at(),
            accuracy: row.result.accuracy(),
        });

        let overall = OverallStats {
            question_bank,
            quizzes_finished: totals.finished,
            mean_accuracy: round2(totals.mean_accuracy),
            total_correct: totals.correct,
            total_attempted: totals.attempted,
            best,
        };

        let mut areas = Vec::new();
        for entry in self.catalog.entries() {
            if entry.subjects.is_empty() {
                continue;
            }
            let question_count = self.questions.count_by_subjects(&entry.subjects).await?;
            let subject_totals = self.results.subject_totals(&entry.subjects).await?;

            let percentage = if subject_totals.attempted > 0 {
                round2(
                    subject_totals.correct as f64 / subject_totals.attempted as f64 * 100.0,
                )
            } else {
                0.0
            };

            areas.push(AreaStats {
                area: entry.name.clone(),
                question_count,
                correct: subject_totals.correct,
                attempted: subject_totals.attempted,
                percentage,
            });
        }

        let recent = self
            .results
            .recent_results(RECENT_RESULTS)
            .await?
            .into_iter()
            .map(|row| RecentResult {
                id: row.id.value(),
                recorded_at: row.result.recorded_at(),
                total: row.result.total(),
                correct: row.result.correct(),
                accuracy: row.result.accuracy(),
            })
            .collect();

        Ok(Dashboard {
            overall,
            areas,
            recent,
        })
    }
}
