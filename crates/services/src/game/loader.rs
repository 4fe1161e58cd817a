use std::sync::Arc;
use std::time::Duration;

use geoquest_core::model::{Difficulty, Question};
use storage::repository::{QuestionQuery, QuestionRepository};

use crate::config::DEFAULT_FETCH_TIMEOUT;
use crate::error::GameError;

/// Fetches a level's questions with a hard deadline.
#[derive(Clone)]
pub struct QuestionLoader {
    questions: Arc<dyn QuestionRepository>,
    timeout: Duration,
}

impl QuestionLoader {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self {
            questions,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load every question for `difficulty`, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Timeout` if the store does not answer in time,
    /// `GameError::Storage` if the query fails, and `GameError::NoQuestions`
    /// if nothing matches.
    pub async fn fetch(&self, difficulty: Difficulty) -> Result<Vec<Question>, GameError> {
        let query = QuestionQuery::for_difficulty(difficulty);
        let docs = tokio::time::timeout(self.timeout, self.questions.query_questions(&query))
            .await
            .map_err(|_| {
                tracing::warn!(%difficulty, timeout = ?self.timeout, "question fetch timed out");
                GameError::Timeout(self.timeout)
            })?
            .inspect_err(|err| {
                tracing::error!(%difficulty, error = %err, "question fetch failed");
            })?;

        if docs.is_empty() {
            tracing::warn!(%difficulty, "no questions for difficulty");
            return Err(GameError::NoQuestions);
        }

        let questions: Vec<Question> = docs.into_iter().map(|doc| doc.into_question()).collect();
        tracing::debug!(%difficulty, count = questions.len(), "loaded questions");
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::repository::{
        InMemoryRepository, QuestionDocument, QuestionWriter, StorageError,
    };

    struct SlowRepository(Duration);

    #[async_trait]
    impl QuestionRepository for SlowRepository {
        async fn query_questions(
            &self,
            _query: &QuestionQuery,
        ) -> Result<Vec<QuestionDocument>, StorageError> {
            tokio::time::sleep(self.0).await;
            Ok(Vec::new())
        }
    }

    struct BrokenRepository;

    #[async_trait]
    impl QuestionRepository for BrokenRepository {
        async fn query_questions(
            &self,
            _query: &QuestionQuery,
        ) -> Result<Vec<QuestionDocument>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    fn difficulty(v: i64) -> Difficulty {
        Difficulty::new(v).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out() {
        let loader = QuestionLoader::new(Arc::new(SlowRepository(Duration::from_secs(10))));
        let err = loader.fetch(difficulty(1)).await.unwrap_err();
        assert!(matches!(err, GameError::Timeout(t) if t == DEFAULT_FETCH_TIMEOUT));
    }

    #[tokio::test]
    async fn storage_failure_is_surfaced() {
        let loader = QuestionLoader::new(Arc::new(BrokenRepository));
        let err = loader.fetch(difficulty(1)).await.unwrap_err();
        assert!(matches!(err, GameError::Storage(StorageError::Connection(_))));
    }

    #[tokio::test]
    async fn empty_result_is_an_error() {
        let loader = QuestionLoader::new(Arc::new(InMemoryRepository::new()));
        let err = loader.fetch(difficulty(4)).await.unwrap_err();
        assert!(matches!(err, GameError::NoQuestions));
    }

    #[tokio::test]
    async fn documents_become_questions_in_title_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_question(&QuestionDocument::new("z", difficulty(2)).with_title("Zamora"))
            .await
            .unwrap();
        repo.upsert_question(&QuestionDocument::new("a", difficulty(2)).with_title("Avila"))
            .await
            .unwrap();

        let loader = QuestionLoader::new(Arc::new(repo)).with_timeout(Duration::from_secs(1));
        let questions = loader.fetch(difficulty(2)).await.unwrap();
        let titles: Vec<_> = questions.iter().map(Question::title).collect();
        assert_eq!(titles, vec!["Avila", "Zamora"]);
    }
}
