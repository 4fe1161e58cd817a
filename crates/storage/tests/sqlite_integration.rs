use chrono::Duration;
use geoquest_core::model::{Coordinate, Difficulty, LevelId, SessionSummary, TargetField};
use geoquest_core::time::fixed_now;
use storage::repository::{
    QuestionDocument, QuestionQuery, QuestionRepository, QuestionWriter, SessionSummaryRepository,
    StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!(
        "sqlite:file:{name}?mode=memory&cache=shared"
    ))
    .await
    .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn difficulty(v: i64) -> Difficulty {
    Difficulty::new(v).unwrap()
}

#[tokio::test]
async fn sqlite_questions_filter_sort_and_resolve_targets() {
    let repo = connect("memdb_questions").await;

    let docs = [
        QuestionDocument::new("toledo", difficulty(2))
            .with_title("Toledo")
            .with_target(TargetField::pair(39.8628, -4.0273)),
        QuestionDocument::new("bilbao", difficulty(2))
            .with_title("Bilbao")
            .with_text("Guggenheim")
            .with_target(TargetField::point(43.2630, -2.9350)),
        QuestionDocument::new("broken", difficulty(2))
            .with_title("Cadiz")
            .with_target(TargetField::text("somewhere south")),
        QuestionDocument::new("untitled", difficulty(2)),
        QuestionDocument::new("madrid", difficulty(1)).with_title("Madrid"),
    ];
    for doc in &docs {
        repo.upsert_question(doc).await.unwrap();
    }

    let found = repo
        .query_questions(&QuestionQuery::for_difficulty(difficulty(2)))
        .await
        .unwrap();
    let questions: Vec<_> = found.into_iter().map(|d| d.into_question()).collect();

    let titles: Vec<_> = questions.iter().map(|q| q.title().to_owned()).collect();
    assert_eq!(titles, vec!["Bilbao", "Cadiz", "Toledo"]);
    assert_eq!(questions[0].text(), "Guggenheim");
    assert_eq!(
        questions[0].target(),
        Coordinate::new(43.2630, -2.9350).unwrap()
    );
    assert_eq!(questions[1].target(), Coordinate::origin());
    assert_eq!(questions[2].text(), "");
}

#[tokio::test]
async fn sqlite_upsert_overwrites_question() {
    let repo = connect("memdb_upsert").await;
    let doc = QuestionDocument::new("q1", difficulty(3)).with_title("First");
    repo.upsert_question(&doc).await.unwrap();
    repo.upsert_question(&doc.clone().with_title("Second"))
        .await
        .unwrap();

    let found = repo
        .query_questions(&QuestionQuery::for_difficulty(difficulty(3)))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title.as_deref(), Some("Second"));
}

#[tokio::test]
async fn sqlite_session_summaries_roundtrip() {
    let repo = connect("memdb_summaries").await;
    let now = fixed_now();

    let older = SessionSummary::from_persisted(
        LevelId::new(1),
        difficulty(2),
        now,
        now + Duration::minutes(1),
        3,
        210,
    )
    .unwrap();
    let newer = SessionSummary::from_persisted(
        LevelId::new(1),
        difficulty(2),
        now + Duration::hours(1),
        now + Duration::hours(1) + Duration::minutes(2),
        3,
        120,
    )
    .unwrap();
    let other_level = SessionSummary::from_persisted(
        LevelId::new(3),
        difficulty(3),
        now,
        now,
        3,
        0,
    )
    .unwrap();

    let older_id = repo.append_summary(&older).await.unwrap();
    let newer_id = repo.append_summary(&newer).await.unwrap();
    repo.append_summary(&other_level).await.unwrap();

    assert_eq!(repo.get_summary(older_id).await.unwrap(), older);

    let rows = repo.list_summaries(LevelId::new(1), 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, newer_id);
    assert_eq!(rows[0].summary.total_score(), 120);
    assert_eq!(rows[1].id, older_id);

    let limited = repo.list_summaries(LevelId::new(1), 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    assert!(matches!(
        repo.get_summary(9_999).await,
        Err(StorageError::NotFound)
    ));
}
