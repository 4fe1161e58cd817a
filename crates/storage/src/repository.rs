use async_trait::async_trait;
use geoquest_core::model::{
    Difficulty, LevelId, Question, QuestionId, SessionSummary, TargetField,
};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A question document as the store hands it back.
///
/// Fields are loosely typed on purpose: documents were authored by hand and
/// any of them may be missing. [`QuestionDocument::into_question`] applies the
/// defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestionDocument {
    pub id: QuestionId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub target: Option<TargetField>,
}

impl QuestionDocument {
    #[must_use]
    pub fn new(id: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id: QuestionId::new(id),
            title: None,
            text: None,
            difficulty: Some(i64::from(difficulty)),
            target: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetField) -> Self {
        self.target = Some(target);
        self
    }

    /// Convert the stored document into a playable `Question`.
    #[must_use]
    pub fn into_question(self) -> Question {
        Question::from_stored(self.id, self.title, self.text, self.target.as_ref())
    }

    /// Whether this document passes the difficulty equality filter.
    #[must_use]
    pub fn matches(&self, query: &QuestionQuery) -> bool {
        self.difficulty == Some(i64::from(query.difficulty))
    }
}

/// Equality filter on difficulty; results are always ordered by title ascending.
///
/// As with the hosted document store, ordering by title drops documents that
/// have no title at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionQuery {
    pub difficulty: Difficulty,
}

impl QuestionQuery {
    #[must_use]
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }
}

/// Persisted session summary with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummaryRow {
    pub id: i64,
    pub summary: SessionSummary,
}

impl SessionSummaryRow {
    #[must_use]
    pub fn new(id: i64, summary: SessionSummary) -> Self {
        Self { id, summary }
    }
}

/// Read side of the question collection.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Run a filtered, title-ordered query.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached or a row cannot be decoded.
    async fn query_questions(
        &self,
        query: &QuestionQuery,
    ) -> Result<Vec<QuestionDocument>, StorageError>;
}

/// Write side of the question collection, used for seeding.
#[async_trait]
pub trait QuestionWriter: Send + Sync {
    /// Insert or replace a question document by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn upsert_question(&self, doc: &QuestionDocument) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SessionSummaryRepository: Send + Sync {
    /// Append a summary and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be stored.
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError>;

    /// Fetch a summary by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError>;

    /// List summaries for a level, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_summaries(
        &self,
        level: LevelId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<QuestionDocument>>>,
    summaries: Arc<Mutex<Vec<SessionSummary>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn query_questions(
        &self,
        query: &QuestionQuery,
    ) -> Result<Vec<QuestionDocument>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        let mut found: Vec<QuestionDocument> = guard
            .iter()
            .filter(|doc| doc.matches(query) && doc.title.is_some())
            .cloned()
            .collect();
        found.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[async_trait]
impl QuestionWriter for InMemoryRepository {
    async fn upsert_question(&self, doc: &QuestionDocument) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        match guard.iter_mut().find(|existing| existing.id == doc.id) {
            Some(existing) => *existing = doc.clone(),
            None => guard.push(doc.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl SessionSummaryRepository for InMemoryRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let mut guard = self.summaries.lock().map_err(poisoned)?;
        guard.push(summary.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Conflict)
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError> {
        let guard = self.summaries.lock().map_err(poisoned)?;
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| guard.get(idx))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_summaries(
        &self,
        level: LevelId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let guard = self.summaries.lock().map_err(poisoned)?;
        let mut rows: Vec<SessionSummaryRow> = guard
            .iter()
            .enumerate()
            .filter(|(_, s)| s.level() == level)
            .filter_map(|(idx, s)| {
                i64::try_from(idx + 1)
                    .ok()
                    .map(|id| SessionSummaryRow::new(id, s.clone()))
            })
            .collect();
        rows.sort_by(|a, b| {
            b.summary
                .completed_at()
                .cmp(&a.summary.completed_at())
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub question_writer: Arc<dyn QuestionWriter>,
    pub session_summaries: Arc<dyn SessionSummaryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            questions: Arc::new(repo.clone()),
            question_writer: Arc::new(repo.clone()),
            session_summaries: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoquest_core::model::Coordinate;
    use geoquest_core::time::fixed_now;

    fn difficulty(v: i64) -> Difficulty {
        Difficulty::new(v).unwrap()
    }

    #[tokio::test]
    async fn query_filters_by_difficulty_and_sorts_by_title() {
        let repo = InMemoryRepository::new();
        for doc in [
            QuestionDocument::new("a", difficulty(2)).with_title("Toledo"),
            QuestionDocument::new("b", difficulty(2)).with_title("Bilbao"),
            QuestionDocument::new("c", difficulty(1)).with_title("Avila"),
            QuestionDocument::new("d", difficulty(2)).with_title("Madrid"),
        ] {
            repo.upsert_question(&doc).await.unwrap();
        }

        let found = repo
            .query_questions(&QuestionQuery::for_difficulty(difficulty(2)))
            .await
            .unwrap();
        let titles: Vec<_> = found.iter().filter_map(|d| d.title.as_deref()).collect();
        assert_eq!(titles, vec!["Bilbao", "Madrid", "Toledo"]);
    }

    #[tokio::test]
    async fn untitled_documents_are_dropped_by_title_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_question(&QuestionDocument::new("x", difficulty(3)))
            .await
            .unwrap();
        let found = repo
            .query_questions(&QuestionQuery::for_difficulty(difficulty(3)))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let repo = InMemoryRepository::new();
        let doc = QuestionDocument::new("q", difficulty(1)).with_title("Old");
        repo.upsert_question(&doc).await.unwrap();
        repo.upsert_question(&doc.clone().with_title("New"))
            .await
            .unwrap();
        let found = repo
            .query_questions(&QuestionQuery::for_difficulty(difficulty(1)))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title.as_deref(), Some("New"));
    }

    #[test]
    fn document_defaults_apply_on_conversion() {
        let q = QuestionDocument::new("q", difficulty(1)).into_question();
        assert_eq!(q.title(), "Quest");
        assert_eq!(q.target(), Coordinate::origin());
    }

    #[test]
    fn documents_deserialize_from_any_target_shape() {
        let raw = r#"[
            {"id": "a", "title": "A", "difficulty": 2, "target": [40.0, "-3.5"]},
            {"id": "b", "title": "B", "difficulty": 2, "target": {"latitude": 40.0, "longitude": -3.5}},
            {"id": "c", "title": "C", "difficulty": 2, "target": "40.0,-3.5"},
            {"id": "d", "title": "D", "difficulty": 2, "target": true},
            {"id": "e", "difficulty": 2}
        ]"#;
        let docs: Vec<QuestionDocument> = serde_json::from_str(raw).unwrap();
        let targets: Vec<_> = docs.into_iter().map(|d| d.into_question().target()).collect();
        let expected = Coordinate::new(40.0, -3.5).unwrap();
        assert_eq!(targets[..3], [expected, expected, expected]);
        assert_eq!(targets[3], Coordinate::origin());
        assert_eq!(targets[4], Coordinate::origin());
    }

    #[tokio::test]
    async fn summaries_list_newest_first_per_level() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        for (level, minutes) in [(1, 0), (1, 10), (2, 5)] {
            let at = now + chrono::Duration::minutes(minutes);
            let summary =
                SessionSummary::from_persisted(LevelId::new(level), difficulty(2), at, at, 3, 150)
                    .unwrap();
            repo.append_summary(&summary).await.unwrap();
        }

        let rows = repo.list_summaries(LevelId::new(1), 10).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(repo.get_summary(3).await.unwrap().level(), LevelId::new(2));
        assert!(matches!(
            repo.get_summary(9).await,
            Err(StorageError::NotFound)
        ));
    }
}
