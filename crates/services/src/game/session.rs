use std::fmt;

use geoquest_core::model::{GameLaunch, GuessAttempt, Question, RunId, SessionSummary};
use geoquest_core::{Quiz, QuizProgress, QuizState};

use crate::error::GameError;

/// One play-through of a level: the quiz plus what launched it.
pub struct GameSession {
    run_id: RunId,
    launch: GameLaunch,
    quiz: Quiz,
    summary_id: Option<i64>,
}

impl GameSession {
    pub(crate) fn new(launch: GameLaunch, quiz: Quiz) -> Self {
        Self {
            run_id: RunId::generate(),
            launch,
            quiz,
            summary_id: None,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub fn launch(&self) -> &GameLaunch {
        &self.launch
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub(crate) fn quiz_mut(&mut self) -> &mut Quiz {
        &mut self.quiz
    }

    #[must_use]
    pub fn state(&self) -> &QuizState {
        self.quiz.state()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.current_question()
    }

    #[must_use]
    pub fn attempts(&self) -> &[GuessAttempt] {
        self.quiz.attempts()
    }

    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.quiz.total_score()
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        self.quiz.progress()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.quiz.is_complete()
    }

    #[must_use]
    pub fn summary_id(&self) -> Option<i64> {
        self.summary_id
    }

    pub(crate) fn set_summary_id(&mut self, id: i64) {
        self.summary_id = Some(id);
    }

    pub(crate) fn build_summary(&self) -> Result<SessionSummary, GameError> {
        let (Some(started_at), Some(completed_at)) =
            (self.quiz.started_at(), self.quiz.completed_at())
        else {
            return Err(GameError::Quiz(geoquest_core::QuizError::InvalidTransition {
                state: "playing",
                action: "summarize an unfinished run",
            }));
        };
        Ok(SessionSummary::from_attempts(
            self.launch.level,
            self.launch.difficulty,
            started_at,
            completed_at,
            self.quiz.attempts(),
        )?)
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("run_id", &self.run_id)
            .field("launch", &self.launch)
            .field("quiz", &self.quiz)
            .field("summary_id", &self.summary_id)
            .finish()
    }
}
