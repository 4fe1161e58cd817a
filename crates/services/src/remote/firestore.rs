use std::env;

use async_trait::async_trait;
use geoquest_core::model::{QuestionId, TargetComponent, TargetField};
use reqwest::Client;
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::{Map, Value, json};
use storage::repository::{QuestionDocument, QuestionQuery, QuestionRepository, StorageError};
use url::Url;

use crate::error::RemoteStoreError;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/";
const DEFAULT_COLLECTION: &str = "questions";

#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub base_url: Url,
    pub project_id: String,
    pub api_key: Option<String>,
    pub collection: String,
}

impl FirestoreConfig {
    /// # Errors
    ///
    /// Returns `RemoteStoreError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str, project_id: impl Into<String>) -> Result<Self, RemoteStoreError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            project_id: project_id.into(),
            api_key: None,
            collection: DEFAULT_COLLECTION.into(),
        })
    }

    /// Builds a config from `GEOQUEST_FIRESTORE_*` variables.
    ///
    /// Returns `None` when no project is configured or the base URL is invalid.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let project_id = env::var("GEOQUEST_FIRESTORE_PROJECT").ok()?;
        if project_id.trim().is_empty() {
            return None;
        }
        let base_url = env::var("GEOQUEST_FIRESTORE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let mut config = match Self::new(&base_url, project_id.trim()) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%base_url, error = %err, "ignoring remote store config");
                return None;
            }
        };
        config.api_key = env::var("GEOQUEST_FIRESTORE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if let Ok(collection) = env::var("GEOQUEST_FIRESTORE_COLLECTION") {
            config.collection = collection;
        }
        Some(config)
    }

    /// Endpoint for structured queries against the default database.
    ///
    /// # Errors
    ///
    /// Returns `RemoteStoreError::InvalidUrl` if the joined URL is invalid.
    pub fn run_query_url(&self) -> Result<Url, RemoteStoreError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut url = base.join(&format!(
            "v1/projects/{}/databases/(default)/documents:runQuery",
            self.project_id
        ))?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

/// Question collection served by the hosted document store's REST API.
#[derive(Clone)]
pub struct FirestoreQuestionRepository {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreQuestionRepository {
    #[must_use]
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn run_query(
        &self,
        query: &QuestionQuery,
    ) -> Result<Vec<QuestionDocument>, RemoteStoreError> {
        let url = self.config.run_query_url()?;
        let response = self
            .client
            .post(url)
            .json(&structured_query(&self.config.collection, query))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteStoreError::HttpStatus(response.status()));
        }

        let rows: Vec<RunQueryRow> = response.json().await?;
        rows.into_iter()
            .filter_map(|row| row.document)
            .map(decode_document)
            .collect()
    }
}

#[async_trait]
impl QuestionRepository for FirestoreQuestionRepository {
    async fn query_questions(
        &self,
        query: &QuestionQuery,
    ) -> Result<Vec<QuestionDocument>, StorageError> {
        Ok(self.run_query(query).await?)
    }
}

//
// ─── WIRE FORMAT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<RemoteDocument>,
}

#[derive(Debug, Deserialize)]
struct RemoteDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

fn structured_query(collection: &str, query: &QuestionQuery) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "difficulty" },
                    "op": "EQUAL",
                    "value": { "integerValue": query.difficulty.value().to_string() }
                }
            },
            "orderBy": [{
                "field": { "fieldPath": "title" },
                "direction": "ASCENDING"
            }]
        }
    })
}

fn decode_document(doc: RemoteDocument) -> Result<QuestionDocument, RemoteStoreError> {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            RemoteStoreError::Decode(format!("document name without id: {}", doc.name))
        })?;

    Ok(QuestionDocument {
        id: QuestionId::new(id),
        title: doc.fields.get("title").and_then(string_value),
        text: doc.fields.get("text").and_then(string_value),
        difficulty: doc.fields.get("difficulty").and_then(integer_value),
        target: doc.fields.get("target").map(target_value),
    })
}

fn string_value(v: &Value) -> Option<String> {
    v.get("stringValue").and_then(Value::as_str).map(str::to_owned)
}

#[allow(clippy::cast_possible_truncation)]
fn integer_value(v: &Value) -> Option<i64> {
    if let Some(raw) = v.get("integerValue") {
        // int64 values travel as JSON strings
        return raw
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| raw.as_i64());
    }
    v.get("doubleValue")
        .and_then(Value::as_f64)
        .filter(|d| d.fract() == 0.0)
        .map(|d| d as i64)
}

fn component_value(v: &Value) -> TargetComponent {
    if let Some(d) = v.get("doubleValue").and_then(Value::as_f64) {
        return TargetComponent::Number(d);
    }
    if let Some(raw) = v.get("integerValue") {
        let parsed = raw
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| raw.as_f64());
        if let Some(n) = parsed {
            return TargetComponent::Number(n);
        }
    }
    // Anything else parses as "not a number" downstream.
    TargetComponent::Text(string_value(v).unwrap_or_default())
}

fn target_value(v: &Value) -> TargetField {
    if let Some(array) = v.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(component_value).collect())
            .unwrap_or_default();
        return TargetField::Pair(values);
    }
    if let Some(point) = v.get("geoPointValue") {
        // zero coordinates are omitted from the wire format
        let coord = |key: &str| {
            TargetComponent::Number(point.get(key).and_then(Value::as_f64).unwrap_or(0.0))
        };
        return TargetField::Point {
            latitude: Some(coord("latitude")),
            longitude: Some(coord("longitude")),
        };
    }
    if let Some(fields) = v.get("mapValue").and_then(|m| m.get("fields")) {
        return TargetField::Point {
            latitude: fields.get("latitude").map(component_value),
            longitude: fields.get("longitude").map(component_value),
        };
    }
    if let Some(text) = string_value(v) {
        return TargetField::Text(text);
    }
    TargetField::Unsupported(IgnoredAny)
}
