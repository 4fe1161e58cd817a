use geoquest_core::model::{LevelId, SessionSummary};

use super::SqliteRepository;
use super::mapping::{conn, map_summary_row, map_summary_row_with_id};
use crate::repository::{SessionSummaryRepository, SessionSummaryRow, StorageError};

#[async_trait::async_trait]
impl SessionSummaryRepository for SqliteRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO session_summaries (
                    level_id, difficulty, started_at, completed_at, questions, total_score
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(i64::from(summary.level().value()))
        .bind(i64::from(summary.difficulty()))
        .bind(summary.started_at())
        .bind(summary.completed_at())
        .bind(i64::from(summary.questions()))
        .bind(i64::from(summary.total_score()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError> {
        let row = sqlx::query(
            r"
                SELECT level_id, difficulty, started_at, completed_at, questions, total_score
                FROM session_summaries
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_summary_row(&row)
    }

    async fn list_summaries(
        &self,
        level: LevelId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, level_id, difficulty, started_at, completed_at, questions, total_score
                FROM session_summaries
                WHERE level_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(i64::from(level.value()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_summary_row_with_id).collect()
    }
}
