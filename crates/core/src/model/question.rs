use thiserror::Error;

use crate::model::{
    ids::QuestionId,
    options::{OptionLetter, OptionSet, OptionSetError},
};

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question fields, as produced by import tooling or a storage row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub subject: String,
    pub difficulty: Option<String>,
    pub prompt: String,
    pub options: OptionSet,
    pub correct: OptionLetter,
    pub rationale: Option<String>,
    pub hint: Option<String>,
    pub formula: Option<String>,
    pub issuer: Option<String>,
}

impl QuestionDraft {
    /// Checks the draft's invariants and normalizes optional labels
    /// (blank difficulty/issuer become `None`).
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the subject or prompt is blank or the
    /// correct letter is not among the offered options.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        if self.subject.trim().is_empty() {
            return Err(QuestionError::BlankSubject);
        }
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::BlankPrompt);
        }
        if !self.options.contains(self.correct) {
            return Err(QuestionError::CorrectOptionMissing(self.correct));
        }

        Ok(ValidatedQuestion {
            subject: self.subject,
            difficulty: normalize(self.difficulty),
            prompt: self.prompt,
            options: self.options,
            correct: self.correct,
            rationale: normalize(self.rationale),
            hint: normalize(self.hint),
            formula: normalize(self.formula),
            issuer: normalize(self.issuer),
        })
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A question that passed validation but has not been assigned a store id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub subject: String,
    pub difficulty: Option<String>,
    pub prompt: String,
    pub options: OptionSet,
    pub correct: OptionLetter,
    pub rationale: Option<String>,
    pub hint: Option<String>,
    pub formula: Option<String>,
    pub issuer: Option<String>,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            subject: self.subject,
            difficulty: self.difficulty,
            prompt: self.prompt,
            options: self.options,
            correct: self.correct,
            rationale: self.rationale,
            hint: self.hint,
            formula: self.formula,
            issuer: self.issuer,
        }
    }
}

/// A stored multiple-choice question. Immutable once imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub subject: String,
    pub difficulty: Option<String>,
    pub prompt: String,
    pub options: OptionSet,
    pub correct: OptionLetter,
    pub rationale: Option<String>,
    pub hint: Option<String>,
    pub formula: Option<String>,
    pub issuer: Option<String>,
}

impl Question {
    /// Whether the chosen letter matches the stored correct option.
    /// Letters are case-normalized at parse time, so plain equality suffices.
    #[must_use]
    pub fn is_correct(&self, chosen: OptionLetter) -> bool {
        self.correct == chosen
    }
}

//
// ─── QUESTION VALIDATION ERRORS ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionError {
    #[error("question subject is blank")]
    BlankSubject,

    #[error("question prompt is blank")]
    BlankPrompt,

    #[error("correct option {0} is not among the offered options")]
    CorrectOptionMissing(OptionLetter),

    #[error("invalid options: {0}")]
    Options(#[from] OptionSetError),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
