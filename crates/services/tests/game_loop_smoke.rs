use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use geoquest_core::model::{
    Coordinate, Difficulty, Level, LevelId, SessionSummary, TargetField,
};
use geoquest_core::time::fixed_now;
use geoquest_core::{QuizError, QuizState};
use services::{
    Advance, AlertAction, Clock, GameError, GameLoopService, HistoryService, ResultsView,
};
use storage::repository::{
    InMemoryRepository, QuestionDocument, QuestionWriter, SessionSummaryRepository,
    SessionSummaryRow, Storage, StorageError,
};

async fn seeded_repo() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    let d2 = Difficulty::new(2).unwrap();
    for doc in [
        QuestionDocument::new("3", d2)
            .with_title("C Toledo")
            .with_target(TargetField::text("39.8628,-4.0273")),
        QuestionDocument::new("1", d2)
            .with_title("A Madrid")
            .with_target(TargetField::pair(40.4168, -3.7038)),
        QuestionDocument::new("2", d2)
            .with_title("B Segovia")
            .with_target(TargetField::point(40.9429, -4.1088)),
    ] {
        repo.upsert_question(&doc).await.unwrap();
    }
    repo
}

fn level_one() -> Level {
    Level::find(LevelId::new(1)).unwrap()
}

#[tokio::test]
async fn three_questions_end_in_results_with_three_records() {
    let repo = seeded_repo().await;
    let service = GameLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );

    let mut session = service.start(level_one().launch(true)).await.unwrap();
    assert_eq!(session.current_question().unwrap().title(), "A Madrid");

    let guesses = [
        Coordinate::new(40.4168, -3.7038).unwrap(),
        Coordinate::new(40.9429, -4.1088).unwrap(),
        Coordinate::new(39.8628, -4.0273).unwrap(),
    ];
    let mut last = None;
    for (i, guess) in guesses.into_iter().enumerate() {
        service.place_marker(&mut session, guess).unwrap();
        let outcome = service.check(&mut session).unwrap();
        assert_eq!(outcome.attempt.score.value(), 100);
        assert_eq!(outcome.is_last, i == 2);
        last = Some(service.advance(&mut session).await.unwrap());
    }

    assert_eq!(session.state(), &QuizState::Results);
    assert_eq!(session.attempts().len(), 3);
    let Some(Advance::Finished {
        total_score,
        summary_id,
    }) = last.clone()
    else {
        panic!("expected finished, got {last:?}");
    };
    assert_eq!(total_score, 300);

    let summary = repo.get_summary(summary_id).await.unwrap();
    assert_eq!(summary.questions(), 3);
    assert_eq!(summary.total_score(), 300);
    assert_eq!(summary.level(), LevelId::new(1));

    // saving again is a no-op
    assert_eq!(
        service.finalize_summary(&mut session).await.unwrap(),
        summary_id
    );
    assert!(repo.get_summary(summary_id + 1).await.is_err());

    let view = ResultsView::from_session(&session);
    assert_eq!(
        view.to_string(),
        "Results Level 1\nA Madrid: 0.00 km → 100 pts\nB Segovia: 0.00 km → 100 pts\nC Toledo: 0.00 km → 100 pts\nTotal score: 300 pts"
    );
}

#[tokio::test]
async fn check_without_marker_prompts_and_keeps_playing() {
    let repo = seeded_repo().await;
    let service = GameLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo),
    );
    let mut session = service.start(level_one().launch(false)).await.unwrap();

    let err = service.check(&mut session).unwrap_err();
    assert!(matches!(err, GameError::Quiz(QuizError::NoMarker)));
    assert_eq!(err.alert().action, AlertAction::Dismiss);
    assert!(matches!(session.state(), QuizState::Active { index: 0, .. }));

    let err = service.advance(&mut session).await.unwrap_err();
    assert!(matches!(err, GameError::Quiz(QuizError::InvalidTransition { .. })));
}

#[tokio::test]
async fn empty_level_alerts_go_back() {
    let storage = Storage::in_memory();
    let service = GameLoopService::new(
        Clock::fixed(fixed_now()),
        storage.questions,
        storage.session_summaries,
    );
    let err = service.start(level_one().launch(true)).await.unwrap_err();
    assert!(matches!(err, GameError::NoQuestions));
    assert_eq!(err.alert().action, AlertAction::GoBack);
}

#[tokio::test]
async fn sqlite_backed_run_shows_up_in_history() {
    let storage = Storage::sqlite("sqlite:file:memdb_game_history?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    storage::seed::seed_questions(storage.question_writer.as_ref())
        .await
        .unwrap();

    let service = GameLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::clone(&storage.questions),
        Arc::clone(&storage.session_summaries),
    );
    let history = HistoryService::new(Arc::clone(&storage.session_summaries));

    let level = Level::find(LevelId::new(3)).unwrap();
    let mut session = service.start(level.launch(true)).await.unwrap();
    while !session.is_complete() {
        service
            .place_marker(&mut session, Coordinate::origin())
            .unwrap();
        service.check(&mut session).unwrap();
        service.advance(&mut session).await.unwrap();
    }

    let items = history.recent(level.id, 10).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].questions, 3);
    assert_eq!(items[0].total_score, 0);
    assert_eq!(history.best_score(level.id).await.unwrap(), Some(0));
    assert_eq!(history.best_score(LevelId::new(2)).await.unwrap(), None);
}

/// Rejects the first append, then behaves like the wrapped repository.
struct FlakySummaries {
    inner: InMemoryRepository,
    failed: AtomicBool,
}

#[async_trait]
impl SessionSummaryRepository for FlakySummaries {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StorageError::Connection("down".into()));
        }
        self.inner.append_summary(summary).await
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError> {
        self.inner.get_summary(id).await
    }

    async fn list_summaries(
        &self,
        level: LevelId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        self.inner.list_summaries(level, limit).await
    }
}

#[tokio::test]
async fn failed_save_at_results_can_be_retried_once() {
    let repo = seeded_repo().await;
    let summaries = Arc::new(FlakySummaries {
        inner: repo.clone(),
        failed: AtomicBool::new(false),
    });
    let service = GameLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        summaries.clone(),
    );

    let mut session = service.start(level_one().launch(true)).await.unwrap();
    let mut last = None;
    while !session.is_complete() {
        service
            .place_marker(&mut session, Coordinate::origin())
            .unwrap();
        service.check(&mut session).unwrap();
        last = Some(service.advance(&mut session).await);
    }

    assert!(matches!(
        last,
        Some(Err(GameError::Storage(StorageError::Connection(_))))
    ));
    assert!(session.is_complete());
    assert_eq!(session.state(), &QuizState::Results);
    assert_eq!(session.summary_id(), None);

    let id = service.finalize_summary(&mut session).await.unwrap();
    assert_eq!(session.summary_id(), Some(id));
    assert_eq!(service.finalize_summary(&mut session).await.unwrap(), id);

    let rows = summaries.list_summaries(LevelId::new(1), 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].summary.questions(), 3);
}
