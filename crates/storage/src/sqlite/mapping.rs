use geoquest_core::model::{
    Difficulty, LevelId, QuestionId, SessionSummary, TargetField,
};
use sqlx::Row;

use crate::repository::{QuestionDocument, SessionSummaryRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn level_id_from_i64(v: i64) -> Result<LevelId, StorageError> {
    Ok(LevelId::new(u32_from_i64("level_id", v)?))
}

/// Targets are stored already resolved, as `"lat,lon"` text.
///
/// Resolving before writing keeps malformed input mapping to (0, 0) exactly as
/// it would have on read.
pub(crate) fn encode_target(target: Option<&TargetField>) -> Option<String> {
    target.map(|field| {
        let c = field.resolve();
        format!("{},{}", c.latitude(), c.longitude())
    })
}

pub(crate) fn map_question_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuestionDocument, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    Ok(QuestionDocument {
        id: QuestionId::new(id),
        title: row.try_get("title").map_err(ser)?,
        text: row.try_get("text").map_err(ser)?,
        difficulty: row.try_get("difficulty").map_err(ser)?,
        target: row
            .try_get::<Option<String>, _>("target")
            .map_err(ser)?
            .map(TargetField::Text),
    })
}

pub(crate) fn map_summary_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SessionSummary, StorageError> {
    let level = level_id_from_i64(row.try_get::<i64, _>("level_id").map_err(ser)?)?;
    let difficulty =
        Difficulty::new(row.try_get::<i64, _>("difficulty").map_err(ser)?).map_err(ser)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;
    let questions = u32_from_i64("questions", row.try_get::<i64, _>("questions").map_err(ser)?)?;
    let total_score = u32_from_i64(
        "total_score",
        row.try_get::<i64, _>("total_score").map_err(ser)?,
    )?;

    SessionSummary::from_persisted(
        level,
        difficulty,
        started_at,
        completed_at,
        questions,
        total_score,
    )
    .map_err(ser)
}

pub(crate) fn map_summary_row_with_id(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SessionSummaryRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    Ok(SessionSummaryRow::new(id, map_summary_row(row)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoquest_core::model::Coordinate;

    #[test]
    fn encoded_targets_resolve_to_the_same_point() {
        let fields = [
            TargetField::pair(40.4168, -3.7038),
            TargetField::point(-33.8688, 151.2093),
            TargetField::text("not a coordinate"),
        ];
        for field in fields {
            let encoded = encode_target(Some(&field)).unwrap();
            assert_eq!(TargetField::Text(encoded).resolve(), field.resolve());
        }
        assert_eq!(encode_target(None), None);
        assert_eq!(
            TargetField::Text(encode_target(Some(&TargetField::text("bad"))).unwrap()).resolve(),
            Coordinate::origin()
        );
    }
}
