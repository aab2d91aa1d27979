use exam_core::model::{QuizReport, ResultId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_result_row, ser},
};
use crate::repository::{OverallTotals, ResultRepository, ResultRow, StorageError, SubjectTotals};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn placeholders(count: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
        out.push_str(&(i + 1).to_string());
    }
    out
}

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_report(&self, report: &QuizReport) -> Result<ResultId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO results (recorded_at, total, correct, accuracy)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(report.result.recorded_at())
        .bind(i64::from(report.result.total()))
        .bind(i64::from(report.result.correct()))
        .bind(report.result.accuracy())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let result_id = res.last_insert_rowid();

        for row in &report.subjects {
            sqlx::query(
                r"
                INSERT INTO subject_performance (result_id, subject, correct, attempted)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(result_id)
            .bind(&row.subject)
            .bind(i64::from(row.correct))
            .bind(i64::from(row.attempted))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;

        let raw = u64::try_from(result_id)
            .map_err(|_| StorageError::Serialization(format!("invalid rowid: {result_id}")))?;
        Ok(ResultId::new(raw))
    }

    async fn overall_totals(&self) -> Result<OverallTotals, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) AS finished,
                AVG(accuracy) AS mean_accuracy,
                COALESCE(SUM(correct), 0) AS correct,
                COALESCE(SUM(total), 0) AS attempted
            FROM results
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let finished: i64 = row.try_get("finished").map_err(ser)?;
        let mean_accuracy: Option<f64> = row.try_get("mean_accuracy").map_err(ser)?;
        let correct: i64 = row.try_get("correct").map_err(ser)?;
        let attempted: i64 = row.try_get("attempted").map_err(ser)?;

        Ok(OverallTotals {
            finished: u64::try_from(finished)
                .map_err(|_| StorageError::Serialization("negative count".into()))?,
            mean_accuracy: mean_accuracy.unwrap_or(0.0),
            correct: u64::try_from(correct)
                .map_err(|_| StorageError::Serialization("negative count".into()))?,
            attempted: u64::try_from(attempted)
                .map_err(|_| StorageError::Serialization("negative count".into()))?,
        })
    }

    async fn best_result(&self) -> Result<Option<ResultRow>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, recorded_at, total, correct, accuracy
            FROM results
            ORDER BY accuracy DESC, recorded_at DESC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_result_row).transpose()
    }

    async fn recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, recorded_at, total, correct, accuracy
            FROM results
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }

    async fn subject_totals(&self, subjects: &[String]) -> Result<SubjectTotals, StorageError> {
        if subjects.is_empty() {
            return Ok(SubjectTotals::default());
        }

        let sql = format!(
            r"
            SELECT
                COALESCE(SUM(correct), 0) AS correct,
                COALESCE(SUM(attempted), 0) AS attempted
            FROM subject_performance
            WHERE subject IN ({})
            ",
            placeholders(subjects.len())
        );

        let mut q = sqlx::query(&sql);
        for subject in subjects {
            q = q.bind(subject);
        }

        let row = q.fetch_one(&self.pool).await.map_err(conn)?;
        let correct: i64 = row.try_get("correct").map_err(ser)?;
        let attempted: i64 = row.try_get("attempted").map_err(ser)?;

        Ok(SubjectTotals {
            correct: u64::try_from(correct)
                .map_err(|_| StorageError::Serialization("negative count".into()))?,
            attempted: u64::try_from(attempted)
                .map_err(|_| StorageError::Serialization("negative count".into()))?,
        })
    }
}
