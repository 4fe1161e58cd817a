#![forbid(unsafe_code)]

pub mod geo;
pub mod model;
pub mod quiz;
pub mod scoring;
pub mod time;

pub use geo::Distance;
pub use quiz::{Quiz, QuizError, QuizProgress, QuizState};
pub use scoring::Score;
pub use time::Clock;
