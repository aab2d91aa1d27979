use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use exam_core::model::{
    AnswerRecord, OptionLetter, Question, QuestionId, QuizReport, QuizResult, QuizSession,
    ResultId, SessionKey, ValidatedQuestion,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── SESSION RECORD ────────────────────────────────────────────────────────────
//

/// Persisted shape for one recorded answer inside a session blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAnswer {
    pub question_id: u64,
    pub chosen: String,
    pub correct: bool,
}

/// Persisted shape for a quiz session.
///
/// This mirrors the domain `QuizSession` so the session store can serialize
/// state as JSON without leaking storage concerns into the domain layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub question_ids: Vec<u64>,
    pub answers: Vec<StoredAnswer>,
    pub cursor: usize,
}

impl SessionRecord {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let mut answers: Vec<StoredAnswer> = session
            .answers()
            .map(|(id, record)| StoredAnswer {
                question_id: id.value(),
                chosen: record.chosen.as_str().to_string(),
                correct: record.correct,
            })
            .collect();
        answers.sort_by_key(|a| a.question_id);

        Self {
            question_ids: session.question_ids().iter().map(|id| id.value()).collect(),
            answers,
            cursor: session.cursor(),
        }
    }

    /// Convert the record back into a domain `QuizSession`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a stored letter is invalid or
    /// the session invariants no longer hold.
    pub fn into_session(self) -> Result<QuizSession, StorageError> {
        let question_ids: Vec<QuestionId> =
            self.question_ids.into_iter().map(QuestionId::new).collect();

        let mut answers = HashMap::with_capacity(self.answers.len());
        for stored in self.answers {
            let chosen: OptionLetter = stored
                .chosen
                .parse()
                .map_err(|e| StorageError::Serialization(format!("stored answer: {e}")))?;
            answers.insert(
                QuestionId::new(stored.question_id),
                AnswerRecord {
                    chosen,
                    correct: stored.correct,
                },
            );
        }

        QuizSession::from_parts(question_ids, answers, self.cursor)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

//
// ─── RESULT ROWS & TOTALS ──────────────────────────────────────────────────────
//

/// A persisted result together with its row id.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub id: ResultId,
    pub result: QuizResult,
}

impl ResultRow {
    #[must_use]
    pub fn new(id: ResultId, result: QuizResult) -> Self {
        Self { id, result }
    }
}

/// Cumulative figures across every stored result.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverallTotals {
    pub finished: u64,
    pub mean_accuracy: f64,
    pub correct: u64,
    pub attempted: u64,
}

/// Cumulative correct/attempted counts across a set of subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubjectTotals {
    pub correct: u64,
    pub attempted: u64,
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a question and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionId, StorageError>;

    /// Fetch one question by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError>;

    /// Fetch questions by id, preserving the requested order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if any are missing, or other storage
    /// errors.
    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError>;

    /// Every question whose subject is in `subjects`, optionally filtered by
    /// issuer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn questions_by_subjects(
        &self,
        subjects: &[String],
        issuer: Option<&str>,
    ) -> Result<Vec<Question>, StorageError>;

    /// Total stored question count.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn count_all(&self) -> Result<u64, StorageError>;

    /// Question count across a set of subjects.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn count_by_subjects(&self, subjects: &[String]) -> Result<u64, StorageError>;

    /// Distinct non-empty issuer labels with question counts, descending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn issuer_counts(&self) -> Result<Vec<(String, u64)>, StorageError>;
}

/// Repository contract for finished quiz results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Persist a result and its subject breakdown atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be stored.
    async fn append_report(&self, report: &QuizReport) -> Result<ResultId, StorageError>;

    /// Cumulative figures across all results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn overall_totals(&self) -> Result<OverallTotals, StorageError>;

    /// The single best-accuracy result, if any result exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn best_result(&self) -> Result<Option<ResultRow>, StorageError>;

    /// Most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError>;

    /// Cumulative correct/attempted counts over subject-performance rows for
    /// the given subjects.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn subject_totals(&self, subjects: &[String]) -> Result<SubjectTotals, StorageError>;
}

/// Repository contract for the per-user session store.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// The active session for a key, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn load_session(&self, key: SessionKey) -> Result<Option<QuizSession>, StorageError>;

    /// Persist (or replace) the session for a key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn save_session(
        &self,
        key: SessionKey,
        session: &QuizSession,
    ) -> Result<(), StorageError>;

    /// Drop the session for a key. Clearing an absent session is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn clear_session(&self, key: SessionKey) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<Question>>>,
    next_question_id: Arc<Mutex<u64>>,
    reports: Arc<Mutex<Vec<(ResultId, QuizReport)>>>,
    next_result_id: Arc<Mutex<u64>>,
    sessions: Arc<Mutex<HashMap<SessionKey, SessionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<'a, T>(guard: &'a Arc<Mutex<T>>) -> Result<std::sync::MutexGuard<'a, T>, StorageError> {
        guard
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionId, StorageError> {
        let mut next = Self::lock(&self.next_question_id)?;
        *next += 1;
        let id = QuestionId::new(*next);
        drop(next);

        let mut questions = Self::lock(&self.questions)?;
        questions.push(question.clone().assign_id(id));
        Ok(id)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let questions = Self::lock(&self.questions)?;
        questions
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        let questions = Self::lock(&self.questions)?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match questions.iter().find(|q| q.id == *id) {
                Some(q) => out.push(q.clone()),
                None => return Err(StorageError::NotFound),
            }
        }
        Ok(out)
    }

    async fn questions_by_subjects(
        &self,
        subjects: &[String],
        issuer: Option<&str>,
    ) -> Result<Vec<Question>, StorageError> {
        let questions = Self::lock(&self.questions)?;
        Ok(questions
            .iter()
            .filter(|q| subjects.contains(&q.subject))
            .filter(|q| match issuer {
                Some(wanted) => q.issuer.as_deref() == Some(wanted),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn count_all(&self) -> Result<u64, StorageError> {
        let questions = Self::lock(&self.questions)?;
        Ok(questions.len() as u64)
    }

    async fn count_by_subjects(&self, subjects: &[String]) -> Result<u64, StorageError> {
        let questions = Self::lock(&self.questions)?;
        Ok(questions
            .iter()
            .filter(|q| subjects.contains(&q.subject))
            .count() as u64)
    }

    async fn issuer_counts(&self) -> Result<Vec<(String, u64)>, StorageError> {
        let questions = Self::lock(&self.questions)?;
        let mut counts: Vec<(String, u64)> = Vec::new();
        for question in questions.iter() {
            let Some(issuer) = question.issuer.as_deref() else {
                continue;
            };
            match counts.iter_mut().find(|(name, _)| name == issuer) {
                Some((_, count)) => *count += 1,
                None => counts.push((issuer.to_string(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(counts)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_report(&self, report: &QuizReport) -> Result<ResultId, StorageError> {
        let mut next = Self::lock(&self.next_result_id)?;
        *next += 1;
        let id = ResultId::new(*next);
        drop(next);

        let mut reports = Self::lock(&self.reports)?;
        reports.push((id, report.clone()));
        Ok(id)
    }

    async fn overall_totals(&self) -> Result<OverallTotals, StorageError> {
        let reports = Self::lock(&self.reports)?;
        let finished = reports.len() as u64;
        if finished == 0 {
            return Ok(OverallTotals::default());
        }

        let mut accuracy_sum = 0.0;
        let mut correct = 0_u64;
        let mut attempted = 0_u64;
        for (_, report) in reports.iter() {
            accuracy_sum += report.result.accuracy();
            correct += u64::from(report.result.correct());
            attempted += u64::from(report.result.total());
        }

        Ok(OverallTotals {
            finished,
            mean_accuracy: accuracy_sum / finished as f64,
            correct,
            attempted,
        })
    }

    async fn best_result(&self) -> Result<Option<ResultRow>, StorageError> {
        let reports = Self::lock(&self.reports)?;
        let best = reports
            .iter()
            .max_by(|a, b| {
                a.1.result
                    .accuracy()
                    .partial_cmp(&b.1.result.accuracy())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(id, report)| ResultRow::new(*id, report.result.clone()));
        Ok(best)
    }

    async fn recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        let reports = Self::lock(&self.reports)?;
        let mut rows: Vec<ResultRow> = reports
            .iter()
            .map(|(id, report)| ResultRow::new(*id, report.result.clone()))
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .recorded_at()
                .cmp(&a.result.recorded_at())
                .then(b.id.value().cmp(&a.id.value()))
        });
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn subject_totals(&self, subjects: &[String]) -> Result<SubjectTotals, StorageError> {
        let reports = Self::lock(&self.reports)?;
        let mut totals = SubjectTotals::default();
        for (_, report) in reports.iter() {
            for row in &report.subjects {
                if subjects.contains(&row.subject) {
                    totals.correct += u64::from(row.correct);
                    totals.attempted += u64::from(row.attempted);
                }
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn load_session(&self, key: SessionKey) -> Result<Option<QuizSession>, StorageError> {
        let sessions = Self::lock(&self.sessions)?;
        sessions
            .get(&key)
            .cloned()
            .map(SessionRecord::into_session)
            .transpose()
    }

    async fn save_session(
        &self,
        key: SessionKey,
        session: &QuizSession,
    ) -> Result<(), StorageError> {
        let mut sessions = Self::lock(&self.sessions)?;
        sessions.insert(key, SessionRecord::from_session(session));
        Ok(())
    }

    async fn clear_session(&self, key: SessionKey) -> Result<(), StorageError> {
        let mut sessions = Self::lock(&self.sessions)?;
        sessions.remove(&key);
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub results: Arc<dyn ResultRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo);
        Self {
            questions,
            results,
            sessions,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{OptionSet, QuestionDraft, QuizReport};
    use exam_core::time::fixed_now;

    fn build_question(subject: &str, issuer: Option<&str>) -> ValidatedQuestion {
        let options = OptionSet::new([
            (OptionLetter::A, "primeira".to_string()),
            (OptionLetter::B, "segunda".to_string()),
        ])
        .unwrap();
        QuestionDraft {
            subject: subject.to_string(),
            difficulty: None,
            prompt: "Enunciado de teste?".to_string(),
            options,
            correct: OptionLetter::A,
            rationale: None,
            hint: None,
            formula: None,
            issuer: issuer.map(str::to_string),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn questions_filter_by_subject_and_issuer() {
        let repo = InMemoryRepository::new();
        repo.insert_question(&build_question("Matemática", Some("CESPE")))
            .await
            .unwrap();
        repo.insert_question(&build_question("Matemática", Some("FGV")))
            .await
            .unwrap();
        repo.insert_question(&build_question("Informática", Some("CESPE")))
            .await
            .unwrap();

        let subjects = vec!["Matemática".to_string()];
        let all = repo.questions_by_subjects(&subjects, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let cespe = repo
            .questions_by_subjects(&subjects, Some("CESPE"))
            .await
            .unwrap();
        assert_eq!(cespe.len(), 1);

        assert_eq!(repo.count_all().await.unwrap(), 3);
        assert_eq!(repo.count_by_subjects(&subjects).await.unwrap(), 2);

        let issuers = repo.issuer_counts().await.unwrap();
        assert_eq!(issuers[0], ("CESPE".to_string(), 2));
    }

    #[tokio::test]
    async fn get_questions_preserves_order_and_detects_missing() {
        let repo = InMemoryRepository::new();
        let first = repo
            .insert_question(&build_question("Matemática", None))
            .await
            .unwrap();
        let second = repo
            .insert_question(&build_question("Informática", None))
            .await
            .unwrap();

        let fetched = repo.get_questions(&[second, first]).await.unwrap();
        assert_eq!(fetched[0].id, second);
        assert_eq!(fetched[1].id, first);

        let err = repo
            .get_questions(&[first, QuestionId::new(999)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn session_store_roundtrips_and_clears() {
        let repo = InMemoryRepository::new();
        let key = SessionKey::generate();
        assert!(repo.load_session(key).await.unwrap().is_none());

        let mut session =
            QuizSession::new(vec![QuestionId::new(1), QuestionId::new(2)]).unwrap();
        session
            .record_answer(
                QuestionId::new(2),
                AnswerRecord {
                    chosen: OptionLetter::B,
                    correct: true,
                },
            )
            .unwrap();
        session.move_to(1).unwrap();

        repo.save_session(key, &session).await.unwrap();
        let loaded = repo.load_session(key).await.unwrap().unwrap();
        assert_eq!(loaded.cursor(), 1);
        assert_eq!(loaded.answered_count(), 1);
        assert!(loaded.answer_for(QuestionId::new(2)).unwrap().correct);

        repo.clear_session(key).await.unwrap();
        assert!(repo.load_session(key).await.unwrap().is_none());
        // clearing twice is fine
        repo.clear_session(key).await.unwrap();
    }

    #[tokio::test]
    async fn result_aggregates_cover_totals_best_and_recent() {
        let repo = InMemoryRepository::new();

        let first = QuizReport::tally(
            fixed_now(),
            [("Matemática", Some(true)), ("Matemática", Some(false))],
        )
        .unwrap();
        let later = fixed_now() + chrono::Duration::hours(1);
        let second = QuizReport::tally(later, [("Matemática", Some(true))]).unwrap();

        repo.append_report(&first).await.unwrap();
        repo.append_report(&second).await.unwrap();

        let totals = repo.overall_totals().await.unwrap();
        assert_eq!(totals.finished, 2);
        assert_eq!(totals.correct, 2);
        assert_eq!(totals.attempted, 3);
        assert_eq!(totals.mean_accuracy, 75.0);

        let best = repo.best_result().await.unwrap().unwrap();
        assert_eq!(best.result.accuracy(), 100.0);

        let recent = repo.recent_results(5).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].result.recorded_at(), later);

        let totals = repo
            .subject_totals(&vec!["Matemática".to_string()])
            .await
            .unwrap();
        assert_eq!(totals.correct, 2);
        assert_eq!(totals.attempted, 3);
    }
}
