use exam_core::model::{
    OptionLetter, OptionSet, Question, QuestionDraft, QuestionId, QuizResult, ResultId,
};
use sqlx::Row;

use crate::repository::{ResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn result_id_from_i64(v: i64) -> Result<ResultId, StorageError> {
    Ok(ResultId::new(i64_to_u64("result_id", v)?))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_letter(s: &str) -> Result<OptionLetter, StorageError> {
    s.parse::<OptionLetter>().map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let options_blob: String = row.try_get("options").map_err(ser)?;
    let options: OptionSet = serde_json::from_str(&options_blob).map_err(ser)?;

    let correct = parse_letter(row.try_get::<String, _>("correct_option").map_err(ser)?.as_str())?;

    let draft = QuestionDraft {
        subject: row.try_get("subject").map_err(ser)?,
        difficulty: row.try_get("difficulty").map_err(ser)?,
        prompt: row.try_get("prompt").map_err(ser)?,
        options,
        correct,
        rationale: row.try_get("rationale").map_err(ser)?,
        hint: row.try_get("hint").map_err(ser)?,
        formula: row.try_get("formula").map_err(ser)?,
        issuer: row.try_get("issuer").map_err(ser)?,
    };

    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    Ok(draft.validate().map_err(ser)?.assign_id(id))
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<ResultRow, StorageError> {
    let id = result_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;

    // Accuracy is recomputed from the counts; the stored column is redundant.
    let result = QuizResult::new(recorded_at, total, correct).map_err(ser)?;
    Ok(ResultRow::new(id, result))
}
