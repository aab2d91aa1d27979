use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use exam_core::Clock;
use exam_core::model::{
    AnswerRecord, AreaCatalog, OptionSet, Question, QuestionId, QuizReport, QuizSession,
    SessionKey,
};
use storage::repository::{
    QuestionRepository, ResultRepository, SessionRepository, StorageError,
};

use crate::error::QuizError;

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// How many questions a quiz should draw from the filtered pool.
///
/// The caller-facing API reserves a sentinel count value for `All`; services
/// only ever see this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizSelection {
    /// Every matching question, shuffled.
    All,
    /// A uniform random sample of at most this many questions.
    Limit(u32),
}

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// A question as shown to the quiz taker: the correct option and the
/// rationale are withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: u64,
    pub subject: String,
    pub difficulty: Option<String>,
    pub prompt: String,
    pub options: OptionSet,
    pub hint: Option<String>,
    pub formula: Option<String>,
    pub issuer: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.value(),
            subject: question.subject.clone(),
            difficulty: question.difficulty.clone(),
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            hint: question.hint.clone(),
            formula: question.formula.clone(),
            issuer: question.issuer.clone(),
        }
    }
}

/// A previously recorded answer, echoed back when revisiting a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerView {
    pub chosen: String,
    pub correct: bool,
}

impl From<&AnswerRecord> for AnswerView {
    fn from(record: &AnswerRecord) -> Self {
        Self {
            chosen: record.chosen.as_str().to_string(),
            correct: record.correct,
        }
    }
}

/// One step of an active quiz: the question at the cursor plus progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizStep {
    pub total: usize,
    pub position: usize,
    pub question: QuestionView,
    pub previous_answer: Option<AnswerView>,
}

/// Outcome of answering a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_option: String,
    pub rationale: String,
}

/// Final figures of a finished quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishReport {
    pub total: u32,
    pub correct: u32,
    pub accuracy: f64,
}

const DEFAULT_RATIONALE: &str = "Sem justificativa detalhada.";

//
// ─── QUIZ SERVICE ──────────────────────────────────────────────────────────────
//

/// Orchestrates the quiz session lifecycle: start, navigate, answer, finish.
///
/// Operations on the same session key are not serialized here; callers must
/// not issue concurrent calls for one session key.
pub struct QuizService {
    clock: Clock,
    catalog: Arc<AreaCatalog>,
    questions: Arc<dyn QuestionRepository>,
    results: Arc<dyn ResultRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<AreaCatalog>,
        questions: Arc<dyn QuestionRepository>,
        results: Arc<dyn ResultRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            questions,
            results,
            sessions,
        }
    }

    /// Starts a fresh quiz for the key, discarding any previous session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoAreaSelected` when the areas resolve to no
    /// subjects, `QuizError::NoQuestionsFound` when the filters match
    /// nothing, and `QuizError::Storage` on repository failures.
    pub async fn start(
        &self,
        key: SessionKey,
        areas: &[String],
        issuer: Option<&str>,
        selection: QuizSelection,
    ) -> Result<QuizStep, QuizError> {
        let subjects = self.catalog.subjects_for(areas);
        if subjects.is_empty() {
            return Err(QuizError::NoAreaSelected);
        }

        let mut pool = self
            .questions
            .questions_by_subjects(&subjects, issuer)
            .await?;
        if pool.is_empty() {
            return Err(QuizError::NoQuestionsFound);
        }

        // Uniform sample without replacement: shuffle, then truncate.
        pool.shuffle(&mut rng());
        if let QuizSelection::Limit(limit) = selection {
            pool.truncate(limit as usize);
        }

        let ids: Vec<QuestionId> = pool.iter().map(|q| q.id).collect();
        let session = QuizSession::new(ids)?;
        self.sessions.save_session(key, &session).await?;

        tracing::info!(total = session.total(), "quiz session started");

        let first = &pool[0];
        Ok(QuizStep {
            total: session.total(),
            position: 0,
            question: QuestionView::from(first),
            previous_answer: None,
        })
    }

    /// Moves the cursor to `index` and returns the question there, along with
    /// any previously recorded answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` when the key has no session and
    /// `QuizError::IndexOutOfRange` for positions outside `[0, total)`.
    pub async fn question_at(&self, key: SessionKey, index: usize) -> Result<QuizStep, QuizError> {
        let mut session = self.load_session(key).await?;
        let id = session.move_to(index)?;
        self.sessions.save_session(key, &session).await?;

        let question = self.fetch_question(id).await?;
        Ok(QuizStep {
            total: session.total(),
            position: index,
            question: QuestionView::from(&question),
            previous_answer: session.answer_for(id).map(AnswerView::from),
        })
    }

    /// Records an answer for a session question, at most once, and reveals
    /// the correct option and rationale.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadyAnswered` on repeat submissions,
    /// `QuizError::InvalidOption` when the letter does not parse or the
    /// question does not offer it, and not-found errors for ids outside the
    /// session or the store.
    pub async fn answer(
        &self,
        key: SessionKey,
        question_id: QuestionId,
        chosen: &str,
    ) -> Result<AnswerOutcome, QuizError> {
        let mut session = self.load_session(key).await?;

        if !session.contains(question_id) {
            return Err(QuizError::QuestionNotInSession(question_id));
        }
        if session.answer_for(question_id).is_some() {
            return Err(QuizError::AlreadyAnswered);
        }

        let chosen = chosen
            .parse()
            .map_err(|_| QuizError::InvalidOption(chosen.to_string()))?;

        let question = self.fetch_question(question_id).await?;
        if !question.options.contains(chosen) {
            return Err(QuizError::InvalidOption(chosen.to_string()));
        }

        let correct = question.is_correct(chosen);
        session.record_answer(question_id, AnswerRecord { chosen, correct })?;
        self.sessions.save_session(key, &session).await?;

        Ok(AnswerOutcome {
            correct,
            correct_option: question.correct.as_uppercase().to_string(),
            rationale: question
                .rationale
                .unwrap_or_else(|| DEFAULT_RATIONALE.to_string()),
        })
    }

    /// Finalizes the quiz: tallies per-subject performance, persists the
    /// result, and clears the session.
    ///
    /// The session is cleared even when tallying or persistence fails, so a
    /// broken finish can never leave a stuck session; the failure is still
    /// reported to the caller.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` when the key has no session and
    /// `QuizError::Storage` when lookups or persistence fail.
    pub async fn finish(&self, key: SessionKey) -> Result<FinishReport, QuizError> {
        let session = self.load_session(key).await?;

        let outcome = self.finalize(&session).await;

        match self.sessions.clear_session(key).await {
            Ok(()) => outcome,
            Err(clear_err) => match outcome {
                Ok(_) => Err(clear_err.into()),
                Err(primary) => {
                    tracing::warn!(error = %clear_err, "failed to clear session after finish error");
                    Err(primary)
                }
            },
        }
    }

    async fn finalize(&self, session: &QuizSession) -> Result<FinishReport, QuizError> {
        let questions = self.questions.get_questions(session.question_ids()).await?;

        let entries = questions.iter().map(|question| {
            (
                question.subject.as_str(),
                session.answer_for(question.id).map(|record| record.correct),
            )
        });
        let report = QuizReport::tally(self.clock.now(), entries)?;

        self.results.append_report(&report).await?;

        tracing::info!(
            total = report.result.total(),
            correct = report.result.correct(),
            "quiz session finished"
        );

        Ok(FinishReport {
            total: report.result.total(),
            correct: report.result.correct(),
            accuracy: report.result.accuracy(),
        })
    }

    async fn load_session(&self, key: SessionKey) -> Result<QuizSession, QuizError> {
        self.sessions
            .load_session(key)
            .await?
            .ok_or(QuizError::NoActiveSession)
    }

    async fn fetch_question(&self, id: QuestionId) -> Result<Question, QuizError> {
        self.questions.get_question(id).await.map_err(|e| match e {
            StorageError::NotFound => QuizError::QuestionNotFound(id),
            other => QuizError::Storage(other),
        })
    }
}
