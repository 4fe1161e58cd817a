use serde::{Deserialize, Serialize};

use crate::geo::Distance;
use crate::model::coordinate::Coordinate;
use crate::model::ids::QuestionId;
use crate::scoring::Score;

/// Record of one checked guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessAttempt {
    pub question_id: QuestionId,
    pub question_title: String,
    pub guess: Coordinate,
    pub target: Coordinate,
    pub distance: Distance,
    /// Seconds between the question being shown and the check.
    pub elapsed_secs: f64,
    pub score: Score,
}
