use serde::{Deserialize, Serialize};

use crate::model::coordinate::{Coordinate, TargetField};
use crate::model::ids::QuestionId;

/// Title shown when a stored question has none.
pub const DEFAULT_TITLE: &str = "Quest";

/// A single "where is this?" prompt with its hidden answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    title: String,
    text: String,
    target: Coordinate,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        title: impl Into<String>,
        text: impl Into<String>,
        target: Coordinate,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            text: text.into(),
            target,
        }
    }

    /// Builds a question from loosely-typed stored fields.
    ///
    /// Empty or missing titles become [`DEFAULT_TITLE`], missing text becomes
    /// empty, and a missing or malformed target resolves to (0, 0).
    #[must_use]
    pub fn from_stored(
        id: QuestionId,
        title: Option<String>,
        text: Option<String>,
        target: Option<&TargetField>,
    ) -> Self {
        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned());
        let text = text.unwrap_or_default();
        let target = target.map_or_else(Coordinate::origin, TargetField::resolve);
        Self::new(id, title, text, target)
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn target(&self) -> Coordinate {
        self.target
    }
}
