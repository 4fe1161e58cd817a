mod attempt;
mod coordinate;
mod ids;
mod level;
mod question;
mod session;

pub use attempt::GuessAttempt;
pub use coordinate::{
    Coordinate, CoordinateError, TargetComponent, TargetField, parse_leading_float,
};
pub use ids::{LevelId, ParseIdError, QuestionId, RunId};
pub use level::{Difficulty, DifficultyError, GameLaunch, Level};
pub use question::{DEFAULT_TITLE, Question};
pub use session::{SessionSummary, SessionSummaryError};
