use std::sync::Arc;

use geoquest_core::model::{Coordinate, GameLaunch, GuessAttempt, Question};
use geoquest_core::{Quiz, QuizState};
use storage::repository::{QuestionRepository, SessionSummaryRepository};

use super::loader::QuestionLoader;
use super::session::GameSession;
use crate::Clock;
use crate::config::GameConfig;
use crate::error::GameError;

/// Result of checking the marker against the current question.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub attempt: GuessAttempt,
    /// Whether the next advance ends the run.
    pub is_last: bool,
}

/// What the game shows after an advance.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next { index: usize, question: Question },
    Finished { total_score: u32, summary_id: i64 },
}

/// Orchestrates loading, answering, and persisting a level run.
#[derive(Clone)]
pub struct GameLoopService {
    clock: Clock,
    loader: QuestionLoader,
    summaries: Arc<dyn SessionSummaryRepository>,
    config: GameConfig,
}

impl GameLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        summaries: Arc<dyn SessionSummaryRepository>,
    ) -> Self {
        let config = GameConfig::default();
        Self {
            clock,
            loader: QuestionLoader::new(questions).with_timeout(config.fetch_timeout),
            summaries,
            config,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.loader = self.loader.with_timeout(config.fetch_timeout);
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fetch the level's questions and show the first one.
    ///
    /// # Errors
    ///
    /// Returns `GameError` if the questions cannot be loaded or none exist.
    pub async fn start(&self, launch: GameLaunch) -> Result<GameSession, GameError> {
        let questions = self.loader.fetch(launch.difficulty).await?;
        let mut quiz = Quiz::new();
        quiz.load(questions, self.clock.now())?;

        let session = GameSession::new(launch, quiz);
        tracing::info!(
            run_id = %session.run_id(),
            level = %launch.level,
            difficulty = %launch.difficulty,
            questions = session.progress().total,
            "game started"
        );
        Ok(session)
    }

    /// Drop or move the guess marker.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Quiz` unless a question is active.
    pub fn place_marker(&self, session: &mut GameSession, at: Coordinate) -> Result<(), GameError> {
        session.quiz_mut().place_marker(at)?;
        Ok(())
    }

    /// Score the placed marker.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Quiz(QuizError::NoMarker)` if nothing was placed.
    pub fn check(&self, session: &mut GameSession) -> Result<CheckOutcome, GameError> {
        let now = self.clock.now();
        let total = session.progress().total;
        let attempt = session.quiz_mut().check(now)?.clone();
        let is_last = matches!(
            session.state(),
            QuizState::Checked { index } if index + 1 == total
        );

        tracing::debug!(
            run_id = %session.run_id(),
            question = %attempt.question_id,
            distance_km = attempt.distance.km(),
            score = attempt.score.value(),
            "guess checked"
        );
        Ok(CheckOutcome { attempt, is_last })
    }

    /// Move on from a checked question, persisting the summary when the run ends.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Quiz` if the current question was not checked, or
    /// `GameError::Storage` if the summary cannot be saved. In the latter case
    /// the session is already finished; retry with [`Self::finalize_summary`].
    pub async fn advance(&self, session: &mut GameSession) -> Result<Advance, GameError> {
        let state = *session.quiz_mut().advance(self.clock.now())?;
        match state {
            QuizState::Active { index, .. } => {
                let question = session
                    .current_question()
                    .cloned()
                    .ok_or(GameError::NoQuestions)?;
                Ok(Advance::Next { index, question })
            }
            _ => {
                let summary_id = self.finalize_summary(session).await?;
                Ok(Advance::Finished {
                    total_score: session.total_score(),
                    summary_id,
                })
            }
        }
    }

    /// Persist the summary of a finished run exactly once.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Quiz` if the run is not finished, or
    /// `GameError::Storage` if persistence fails.
    pub async fn finalize_summary(&self, session: &mut GameSession) -> Result<i64, GameError> {
        if let Some(id) = session.summary_id() {
            return Ok(id);
        }

        let summary = session.build_summary()?;
        let id = self
            .summaries
            .append_summary(&summary)
            .await
            .inspect_err(|err| {
                tracing::error!(run_id = %session.run_id(), error = %err, "saving results failed");
            })?;
        session.set_summary_id(id);

        tracing::info!(
            run_id = %session.run_id(),
            summary_id = id,
            total_score = summary.total_score(),
            "game finished"
        );
        Ok(id)
    }
}
