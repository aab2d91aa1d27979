use chrono::{DateTime, Utc};
use thiserror::Error;

//
// ─── QUIZ RESULT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("a quiz result needs at least one question")]
    NoQuestions,

    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

/// Outcome of one finished quiz. Created once at finalize time, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    recorded_at: DateTime<Utc>,
    total: u32,
    correct: u32,
    accuracy: f64,
}

impl QuizResult {
    /// Builds a result, recomputing the accuracy from the counts.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` for a zero total or `correct > total`.
    pub fn new(
        recorded_at: DateTime<Utc>,
        total: u32,
        correct: u32,
    ) -> Result<Self, ResultError> {
        if total == 0 {
            return Err(ResultError::NoQuestions);
        }
        if correct > total {
            return Err(ResultError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self {
            recorded_at,
            total,
            correct,
            accuracy: round_percentage(correct, total),
        })
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// Accuracy percentage, rounded to 2 decimal places.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }
}

/// `correct / total * 100`, rounded to 2 decimal places. 0 when `total` is 0.
#[must_use]
pub(crate) fn round_percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(correct) / f64::from(total) * 100.0;
    (raw * 100.0).round() / 100.0
}

//
// ─── SUBJECT PERFORMANCE ───────────────────────────────────────────────────────
//

/// Per-subject tally belonging to one result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPerformance {
    pub subject: String,
    pub correct: u32,
    pub attempted: u32,
}

//
// ─── QUIZ REPORT ───────────────────────────────────────────────────────────────
//

/// A result together with its per-subject breakdown, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizReport {
    pub result: QuizResult,
    pub subjects: Vec<SubjectPerformance>,
}

impl QuizReport {
    /// Tallies a finished session: one entry per session question in original
    /// order, carrying its subject and the recorded correctness (`None` for
    /// unanswered).
    ///
    /// Every question counts as attempted for its subject; only recorded
    /// correct answers count as correct. The subject rows keep first-seen
    /// order, and their attempted counts always sum to the result total.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::NoQuestions` for an empty entry list.
    pub fn tally<'a>(
        recorded_at: DateTime<Utc>,
        entries: impl IntoIterator<Item = (&'a str, Option<bool>)>,
    ) -> Result<Self, ResultError> {
        let mut subjects: Vec<SubjectPerformance> = Vec::new();
        let mut total = 0_u32;
        let mut correct = 0_u32;

        for (subject, answer) in entries {
            total = total.saturating_add(1);
            let was_correct = answer == Some(true);
            if was_correct {
                correct = correct.saturating_add(1);
            }

            match subjects.iter_mut().find(|row| row.subject == subject) {
                Some(row) => {
                    row.attempted += 1;
                    if was_correct {
                        row.correct += 1;
                    }
                }
                None => subjects.push(SubjectPerformance {
                    subject: subject.to_string(),
                    correct: u32::from(was_correct),
                    attempted: 1,
                }),
            }
        }

        let result = QuizResult::new(recorded_at, total, correct)?;
        Ok(Self { result, subjects })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn result_recomputes_accuracy() {
        let result = QuizResult::new(fixed_now(), 3, 2).unwrap();
        assert_eq!(result.accuracy(), 66.67);

        let result = QuizResult::new(fixed_now(), 3, 3).unwrap();
        assert_eq!(result.accuracy(), 100.0);
    }

    #[test]
    fn result_rejects_bad_counts() {
        assert!(matches!(
            QuizResult::new(fixed_now(), 0, 0),
            Err(ResultError::NoQuestions)
        ));
        assert!(matches!(
            QuizResult::new(fixed_now(), 2, 3),
            Err(ResultError::CorrectExceedsTotal { .. })
        ));
    }

    #[test]
    fn tally_counts_unanswered_as_attempted_only() {
        let report = QuizReport::tally(
            fixed_now(),
            [
                ("Matemática", Some(true)),
                ("Matemática", None),
                ("Português", Some(false)),
            ],
        )
        .unwrap();

        assert_eq!(report.result.total(), 3);
        assert_eq!(report.result.correct(), 1);

        assert_eq!(report.subjects.len(), 2);
        assert_eq!(report.subjects[0].subject, "Matemática");
        assert_eq!(report.subjects[0].attempted, 2);
        assert_eq!(report.subjects[0].correct, 1);
        assert_eq!(report.subjects[1].subject, "Português");
        assert_eq!(report.subjects[1].attempted, 1);
        assert_eq!(report.subjects[1].correct, 0);

        let attempted_sum: u32 = report.subjects.iter().map(|s| s.attempted).sum();
        assert_eq!(attempted_sum, report.result.total());
    }

    #[test]
    fn tally_rejects_empty_sessions() {
        let entries: [(&str, Option<bool>); 0] = [];
        assert!(matches!(
            QuizReport::tally(fixed_now(), entries),
            Err(ResultError::NoQuestions)
        ));
    }
}
