use std::fmt;

use geoquest_core::model::LevelId;
use geoquest_core::{Distance, QuizError, Score};

use super::session::GameSession;
use crate::error::GameError;

/// One row on the results screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultLine {
    pub title: String,
    pub distance: Distance,
    pub score: Score,
}

impl fmt::Display for ResultLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} km → {} pts", self.title, self.distance, self.score)
    }
}

/// Everything the results screen shows for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub level: LevelId,
    pub lines: Vec<ResultLine>,
    pub total_score: u32,
}

impl ResultsView {
    #[must_use]
    pub fn from_session(session: &GameSession) -> Self {
        let lines = session
            .attempts()
            .iter()
            .map(|a| ResultLine {
                title: a.question_title.clone(),
                distance: a.distance,
                score: a.score,
            })
            .collect();
        Self {
            level: session.launch().level,
            lines,
            total_score: session.total_score(),
        }
    }
}

impl fmt::Display for ResultsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results Level {}", self.level)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        write!(f, "Total score: {} pts", self.total_score)
    }
}

/// What the single button on an alert does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    /// Leave the game and return to the level list.
    GoBack,
    /// Close the alert and keep playing.
    Dismiss,
}

/// A user-facing message for a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub action: AlertAction,
}

impl Alert {
    fn go_back(message: impl Into<String>) -> Self {
        Self {
            title: "Error".into(),
            message: message.into(),
            action: AlertAction::GoBack,
        }
    }
}

impl GameError {
    /// The alert to show the player for this error.
    #[must_use]
    pub fn alert(&self) -> Alert {
        match self {
            GameError::Quiz(QuizError::NoMarker) => Alert {
                title: "Select a point on the map".into(),
                message: String::new(),
                action: AlertAction::Dismiss,
            },
            GameError::NoQuestions | GameError::Quiz(QuizError::NoQuestions) => {
                Alert::go_back("There are no questions for this level yet.")
            }
            GameError::Timeout(_) | GameError::Storage(_) => {
                Alert::go_back("Could not load the questions.")
            }
            _ => Alert::go_back("Something went wrong."),
        }
    }
}
