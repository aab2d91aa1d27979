use chrono::Utc;
use exam_core::model::{QuizSession, SessionKey};
use sqlx::Row;

use super::{SqliteRepository, mapping::ser};
use crate::repository::{SessionRecord, SessionRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn load_session(&self, key: SessionKey) -> Result<Option<QuizSession>, StorageError> {
        let row = sqlx::query("SELECT state FROM quiz_sessions WHERE session_key = ?1")
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state: String = row.try_get("state").map_err(ser)?;
        let record: SessionRecord = serde_json::from_str(&state).map_err(ser)?;
        record.into_session().map(Some)
    }

    async fn save_session(
        &self,
        key: SessionKey,
        session: &QuizSession,
    ) -> Result<(), StorageError> {
        let state =
            serde_json::to_string(&SessionRecord::from_session(session)).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO quiz_sessions (session_key, state, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(session_key) DO UPDATE SET
                state = excluded.state,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.to_string())
        .bind(state)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn clear_session(&self, key: SessionKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM quiz_sessions WHERE session_key = ?1")
            .bind(key.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
