use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Difficulty, GuessAttempt, LevelId};
use crate::scoring::Score;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many attempts for a single session: {len}")]
    TooManyAttempts { len: usize },

    #[error("total score ({total}) exceeds the maximum for {questions} questions")]
    ScoreOutOfRange { total: u32, questions: u32 },
}

/// Aggregate result of a finished level run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    level: LevelId,
    difficulty: Difficulty,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    questions: u32,
    total_score: u32,
}

impl SessionSummary {
    /// Rehydrate a session summary from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if the run ends before it starts.
    /// Returns `SessionSummaryError::ScoreOutOfRange` if the total cannot come from `questions` scores.
    pub fn from_persisted(
        level: LevelId,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        questions: u32,
        total_score: u32,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        let max = questions.saturating_mul(u32::from(Score::MAX.value()));
        if total_score > max {
            return Err(SessionSummaryError::ScoreOutOfRange {
                total: total_score,
                questions,
            });
        }

        Ok(Self {
            level,
            difficulty,
            started_at,
            completed_at,
            questions,
            total_score,
        })
    }

    /// Build a summary from the attempts recorded during a run.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SessionSummaryError::TooManyAttempts` if the count cannot fit in `u32`.
    pub fn from_attempts(
        level: LevelId,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        attempts: &[GuessAttempt],
    ) -> Result<Self, SessionSummaryError> {
        let questions = u32::try_from(attempts.len())
            .map_err(|_| SessionSummaryError::TooManyAttempts { len: attempts.len() })?;
        let total_score = attempts
            .iter()
            .fold(0_u32, |acc, a| acc.saturating_add(u32::from(a.score.value())));

        Self::from_persisted(
            level,
            difficulty,
            started_at,
            completed_at,
            questions,
            total_score,
        )
    }

    #[must_use]
    pub fn level(&self) -> LevelId {
        self.level
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn questions(&self) -> u32 {
        self.questions
    }

    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.total_score
    }
}
