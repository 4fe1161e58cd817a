use chrono::{DateTime, Utc};
use std::sync::Arc;

use geoquest_core::model::{Difficulty, LevelId, SessionSummary};
use storage::repository::SessionSummaryRepository;

use crate::error::GameError;

/// Storage identifier for a persisted session summary.
pub type SessionSummaryId = i64;

/// Presentation-agnostic list item for a past run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub id: SessionSummaryId,
    pub difficulty: Difficulty,
    pub completed_at: DateTime<Utc>,
    pub questions: u32,
    pub total_score: u32,
}

impl HistoryItem {
    #[must_use]
    pub fn from_summary(id: SessionSummaryId, summary: &SessionSummary) -> Self {
        Self {
            id,
            difficulty: summary.difficulty(),
            completed_at: summary.completed_at(),
            questions: summary.questions(),
            total_score: summary.total_score(),
        }
    }
}

/// Read access to past results.
#[derive(Clone)]
pub struct HistoryService {
    summaries: Arc<dyn SessionSummaryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(summaries: Arc<dyn SessionSummaryRepository>) -> Self {
        Self { summaries }
    }

    /// Most recent runs of `level`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Storage` if the query fails.
    pub async fn recent(
        &self,
        level: LevelId,
        limit: u32,
    ) -> Result<Vec<HistoryItem>, GameError> {
        let rows = self.summaries.list_summaries(level, limit).await?;
        Ok(rows
            .iter()
            .map(|row| HistoryItem::from_summary(row.id, &row.summary))
            .collect())
    }

    /// Highest total ever scored on `level`, if it has been played.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Storage` if the query fails.
    pub async fn best_score(&self, level: LevelId) -> Result<Option<u32>, GameError> {
        let rows = self.summaries.list_summaries(level, u32::MAX).await?;
        Ok(rows.iter().map(|row| row.summary.total_score()).max())
    }
}
