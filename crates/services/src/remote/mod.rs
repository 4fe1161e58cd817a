//! Adapters for question stores reached over the network.

mod firestore;

pub use firestore::{FirestoreConfig, FirestoreQuestionRepository};
