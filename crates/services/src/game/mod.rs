mod history;
mod loader;
mod session;
mod view;
mod workflow;

// Public API of the game subsystem.
pub use crate::error::GameError;
pub use history::{HistoryItem, HistoryService, SessionSummaryId};
pub use loader::QuestionLoader;
pub use session::GameSession;
pub use view::{Alert, AlertAction, ResultLine, ResultsView};
pub use workflow::{Advance, CheckOutcome, GameLoopService};
