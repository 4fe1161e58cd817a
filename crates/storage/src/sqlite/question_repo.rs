use async_trait::async_trait;

use super::SqliteRepository;
use super::mapping::{conn, encode_target, map_question_row};
use crate::repository::{
    QuestionDocument, QuestionQuery, QuestionRepository, QuestionWriter, StorageError,
};

#[async_trait]
impl QuestionRepository for SqliteRepository {
    async fn query_questions(
        &self,
        query: &QuestionQuery,
    ) -> Result<Vec<QuestionDocument>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, title, text, difficulty, target
                FROM questions
                WHERE difficulty = ?1 AND title IS NOT NULL
                ORDER BY title ASC, id ASC
            ",
        )
        .bind(i64::from(query.difficulty))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }
}

#[async_trait]
impl QuestionWriter for SqliteRepository {
    async fn upsert_question(&self, doc: &QuestionDocument) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO questions (id, title, text, difficulty, target)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    text = excluded.text,
                    difficulty = excluded.difficulty,
                    target = excluded.target
            ",
        )
        .bind(doc.id.as_str())
        .bind(doc.title.as_deref())
        .bind(doc.text.as_deref())
        .bind(doc.difficulty)
        .bind(encode_target(doc.target.as_ref()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
