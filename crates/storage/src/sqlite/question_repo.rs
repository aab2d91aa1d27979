use std::collections::HashMap;

use exam_core::model::{Question, QuestionId, ValidatedQuestion};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_question_row, question_id_to_i64, ser},
};
use crate::repository::{QuestionRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Builds a `?n, ?n+1, …` placeholder list starting at `first`.
fn placeholders(count: usize, first: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
        out.push_str(&(first + i).to_string());
    }
    out
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionId, StorageError> {
        let options_blob = serde_json::to_string(&question.options).map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO questions (
                subject, difficulty, prompt, options, correct_option,
                rationale, hint, formula, issuer
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(&question.subject)
        .bind(&question.difficulty)
        .bind(&question.prompt)
        .bind(options_blob)
        .bind(question.correct.as_str())
        .bind(&question.rationale)
        .bind(&question.hint)
        .bind(&question.formula)
        .bind(&question.issuer)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let raw = res.last_insert_rowid();
        let raw = u64::try_from(raw)
            .map_err(|_| StorageError::Serialization(format!("invalid rowid: {raw}")))?;
        Ok(QuestionId::new(raw))
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                id, subject, difficulty, prompt, options, correct_option,
                rationale, hint, formula, issuer
            FROM questions
            WHERE id = ?1
            ",
        )
        .bind(question_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_question_row(&row)
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r"
            SELECT
                id, subject, difficulty, prompt, options, correct_option,
                rationale, hint, formula, issuer
            FROM questions
            WHERE id IN ({})
            ",
            placeholders(ids.len(), 1)
        );

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(question_id_to_i64(*id)?);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(conn)?;

        let mut by_id: HashMap<u64, Question> = HashMap::with_capacity(rows.len());
        for row in rows {
            let question = map_question_row(&row)?;
            by_id.insert(question.id.value(), question);
        }

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match by_id.remove(&id.value()) {
                Some(question) => out.push(question),
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
        if subjects.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            r"
            SELECT
                id, subject, difficulty, prompt, options, correct_option,
                rationale, hint, formula, issuer
            FROM questions
            WHERE subject IN ({})
            ",
            placeholders(subjects.len(), 1)
        );
        if issuer.is_some() {
            sql.push_str(&format!(" AND issuer = ?{}", subjects.len() + 1));
        }

        let mut q = sqlx::query(&sql);
        for subject in subjects {
            q = q.bind(subject);
        }
        if let Some(issuer) = issuer {
            q = q.bind(issuer);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(conn)?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }
        Ok(questions)
    }

    async fn count_all(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        let total: i64 = row.try_get("total").map_err(ser)?;
        u64::try_from(total).map_err(|_| StorageError::Serialization("negative count".into()))
    }

    async fn count_by_subjects(&self, subjects: &[String]) -> Result<u64, StorageError> {
        if subjects.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "SELECT COUNT(*) AS total FROM questions WHERE subject IN ({})",
            placeholders(subjects.len(), 1)
        );

        let mut q = sqlx::query(&sql);
        for subject in subjects {
            q = q.bind(subject);
        }

        let row = q.fetch_one(&self.pool).await.map_err(conn)?;
        let total: i64 = row.try_get("total").map_err(ser)?;
        u64::try_from(total).map_err(|_| StorageError::Serialization("negative count".into()))
    }

    async fn issuer_counts(&self) -> Result<Vec<(String, u64)>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT issuer, COUNT(*) AS total
            FROM questions
            WHERE issuer IS NOT NULL AND issuer != ''
            GROUP BY issuer
            ORDER BY total DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let issuer: String = row.try_get("issuer").map_err(ser)?;
            let total: i64 = row.try_get("total").map_err(ser)?;
            let total = u64::try_from(total)
                .map_err(|_| StorageError::Serialization("negative count".into()))?;
            out.push((issuer, total));
        }
        Ok(out)
    }
}
