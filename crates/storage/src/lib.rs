#![forbid(unsafe_code)]

pub mod repository;
pub mod seed;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, QuestionDocument, QuestionQuery, QuestionRepository, QuestionWriter,
    SessionSummaryRepository, SessionSummaryRow, Storage, StorageError,
};
