use std::collections::HashMap;
use thiserror::Error;

use crate::model::{ids::QuestionId, options::OptionLetter};

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// A recorded answer for one question in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub chosen: OptionLetter,
    pub correct: bool,
}

//
// ─── QUIZ SESSION ──────────────────────────────────────────────────────────────
//

/// One in-progress quiz for a single user.
///
/// The question order is fixed at creation, each question can be answered at
/// most once, and the cursor always stays within `[0, total)`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    question_ids: Vec<QuestionId>,
    answers: HashMap<QuestionId, AnswerRecord>,
    cursor: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionStateError {
    #[error("a quiz session needs at least one question")]
    Empty,

    #[error("question index {index} out of range (total {total})")]
    OutOfRange { index: usize, total: usize },

    #[error("question {0} already answered in this session")]
    AlreadyAnswered(QuestionId),

    #[error("question {0} is not part of this session")]
    NotInSession(QuestionId),
}

impl QuizSession {
    /// Creates a fresh session over the given question order, cursor at 0.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Empty` for an empty question list.
    pub fn new(question_ids: Vec<QuestionId>) -> Result<Self, SessionStateError> {
        if question_ids.is_empty() {
            return Err(SessionStateError::Empty);
        }
        Ok(Self {
            question_ids,
            answers: HashMap::new(),
            cursor: 0,
        })
    }

    /// Rehydrates a session from persisted parts, re-checking the invariants.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` when the list is empty, the cursor is out
    /// of range, or an answer references a question outside the session.
    pub fn from_parts(
        question_ids: Vec<QuestionId>,
        answers: HashMap<QuestionId, AnswerRecord>,
        cursor: usize,
    ) -> Result<Self, SessionStateError> {
        if question_ids.is_empty() {
            return Err(SessionStateError::Empty);
        }
        if cursor >= question_ids.len() {
            return Err(SessionStateError::OutOfRange {
                index: cursor,
                total: question_ids.len(),
            });
        }
        for id in answers.keys() {
            if !question_ids.contains(id) {
                return Err(SessionStateError::NotInSession(*id));
            }
        }
        Ok(Self {
            question_ids,
            answers,
            cursor,
        })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.question_ids.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.question_ids
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.question_ids.contains(&id)
    }

    /// Question id at a position, without moving the cursor.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::OutOfRange` for positions outside
    /// `[0, total)`.
    pub fn question_at(&self, index: usize) -> Result<QuestionId, SessionStateError> {
        self.question_ids
            .get(index)
            .copied()
            .ok_or(SessionStateError::OutOfRange {
                index,
                total: self.question_ids.len(),
            })
    }

    /// Moves the cursor and returns the question id at the new position.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::OutOfRange` for positions outside
    /// `[0, total)`; the cursor is left untouched in that case.
    pub fn move_to(&mut self, index: usize) -> Result<QuestionId, SessionStateError> {
        let id = self.question_at(index)?;
        self.cursor = index;
        Ok(id)
    }

    /// Records an answer for a session question, at most once.
    ///
    /// # Errors
    ///
    /// Returns `NotInSession` for foreign question ids and `AlreadyAnswered`
    /// on repeat submissions.
    pub fn record_answer(
        &mut self,
        id: QuestionId,
        record: AnswerRecord,
    ) -> Result<(), SessionStateError> {
        if !self.contains(id) {
            return Err(SessionStateError::NotInSession(id));
        }
        if self.answers.contains_key(&id) {
            return Err(SessionStateError::AlreadyAnswered(id));
        }
        self.answers.insert(id, record);
        Ok(())
    }

    #[must_use]
    pub fn answer_for(&self, id: QuestionId) -> Option<&AnswerRecord> {
        self.answers.get(&id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn answers(&self) -> impl Iterator<Item = (QuestionId, &AnswerRecord)> {
        self.answers.iter().map(|(id, record)| (*id, record))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
