//! Sample question set used to populate an empty database.

use geoquest_core::model::{Difficulty, DifficultyError, TargetField};

use crate::repository::{QuestionDocument, QuestionWriter, StorageError};

struct Sample {
    id: &'static str,
    difficulty: i64,
    title: &'static str,
    text: &'static str,
    latitude: f64,
    longitude: f64,
}

const SAMPLES: &[Sample] = &[
    Sample {
        id: "madrid",
        difficulty: 1,
        title: "Madrid",
        text: "Find the capital of Spain.",
        latitude: 40.4168,
        longitude: -3.7038,
    },
    Sample {
        id: "barcelona",
        difficulty: 1,
        title: "Barcelona",
        text: "Where does the Sagrada Familia stand?",
        latitude: 41.4036,
        longitude: 2.1744,
    },
    Sample {
        id: "sevilla",
        difficulty: 1,
        title: "Sevilla",
        text: "Locate the city of the Giralda.",
        latitude: 37.3861,
        longitude: -5.9926,
    },
    Sample {
        id: "toledo",
        difficulty: 2,
        title: "Toledo",
        text: "The city of three cultures, on the Tagus.",
        latitude: 39.8628,
        longitude: -4.0273,
    },
    Sample {
        id: "salamanca",
        difficulty: 2,
        title: "Salamanca",
        text: "Home of one of Europe's oldest universities.",
        latitude: 40.9701,
        longitude: -5.6635,
    },
    Sample {
        id: "granada",
        difficulty: 2,
        title: "Granada",
        text: "Place the marker on the Alhambra.",
        latitude: 37.1761,
        longitude: -3.5881,
    },
    Sample {
        id: "teide",
        difficulty: 3,
        title: "Teide",
        text: "The highest peak in Spain.",
        latitude: 28.2724,
        longitude: -16.6425,
    },
    Sample {
        id: "covadonga",
        difficulty: 3,
        title: "Covadonga",
        text: "A sanctuary in the Picos de Europa.",
        latitude: 43.3096,
        longitude: -5.0564,
    },
    Sample {
        id: "finisterre",
        difficulty: 3,
        title: "Finisterre",
        text: "The old end of the known world.",
        latitude: 42.8825,
        longitude: -9.2717,
    },
];

/// Builds the sample documents, cycling through shapes the store accepts.
///
/// # Errors
///
/// Returns `DifficultyError` if a sample carries an invalid difficulty.
pub fn sample_questions() -> Result<Vec<QuestionDocument>, DifficultyError> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let target = match idx % 3 {
                0 => TargetField::pair(s.latitude, s.longitude),
                1 => TargetField::point(s.latitude, s.longitude),
                _ => TargetField::text(format!("{},{}", s.latitude, s.longitude)),
            };
            Ok(QuestionDocument::new(s.id, Difficulty::new(s.difficulty)?)
                .with_title(s.title)
                .with_text(s.text)
                .with_target(target))
        })
        .collect()
}

/// Errors raised while seeding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Upserts the sample set and returns how many documents were written.
///
/// # Errors
///
/// Returns `SeedError` if a document cannot be built or stored.
pub async fn seed_questions(writer: &dyn QuestionWriter) -> Result<usize, SeedError> {
    let docs = sample_questions()?;
    for doc in &docs {
        writer.upsert_question(doc).await?;
    }
    tracing::info!(count = docs.len(), "seeded sample questions");
    Ok(docs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryRepository, QuestionQuery, QuestionRepository};

    #[tokio::test]
    async fn every_catalog_difficulty_has_questions() {
        let repo = InMemoryRepository::new();
        let written = seed_questions(&repo).await.unwrap();
        assert_eq!(written, SAMPLES.len());

        for d in 1..=3 {
            let found = repo
                .query_questions(&QuestionQuery::for_difficulty(Difficulty::new(d).unwrap()))
                .await
                .unwrap();
            assert_eq!(found.len(), 3, "difficulty {d}");
        }
    }

    #[test]
    fn samples_resolve_to_their_coordinates() {
        for (doc, sample) in sample_questions().unwrap().into_iter().zip(SAMPLES) {
            let q = doc.into_question();
            assert_eq!(q.target().latitude(), sample.latitude);
            assert_eq!(q.target().longitude(), sample.longitude);
        }
    }
}
