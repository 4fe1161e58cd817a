#![forbid(unsafe_code)]

pub mod audio;
pub mod config;
pub mod error;
pub mod game;
pub mod remote;

pub use geoquest_core::Clock;

pub use audio::{AudioBackend, AudioError, SilentBackend, SoundtrackController};
pub use config::GameConfig;
pub use error::{GameError, RemoteStoreError};
pub use game::{
    Advance, Alert, AlertAction, CheckOutcome, GameLoopService, GameSession, HistoryItem,
    HistoryService, QuestionLoader, ResultLine, ResultsView,
};
pub use remote::{FirestoreConfig, FirestoreQuestionRepository};
