//! Cloud Firestore over its REST v1 API
//!
//! Documents travel as typed values (`{"stringValue": ..}`,
//! `{"mapValue": {"fields": ..}}`); this module converts between those and
//! plain JSON. There is no streaming listener over REST, so
//! [`DocumentClient::watch`] polls the collection and bumps the version
//! counter when its contents change.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Map, Number, Value};
use tokio::sync::watch;

use super::remote::DocumentClient;
use crate::config::FirebaseConfig;
use crate::types::{Result, SoberError};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 15;

const PAGE_SIZE: &str = "300";

#[derive(Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: String,
    id_token: String,
    poll_interval: Duration,
}

impl FirestoreClient {
    pub fn new(config: &FirebaseConfig, id_token: impl Into<String>, poll_interval: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            id_token: id_token.into(),
            poll_interval,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn document_url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, path
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.document_url(path))
            .bearer_auth(&self.id_token)
            .query(&[("key", self.api_key.as_str())])
    }

    /// Raw document resources of one collection, following page tokens
    async fn list_raw(&self, collection: &str) -> Result<Vec<Value>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .request(reqwest::Method::GET, collection)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = check_status(request.send().await?, collection).await?;
            let mut body: Value = response.json().await?;

            if let Some(Value::Array(page)) = body.get_mut("documents").map(Value::take) {
                documents.extend(page);
            }
            page_token = body
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        Ok(documents)
    }
}

/// Map HTTP failures onto the error taxonomy
async fn check_status(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SoberError::PermissionDenied(
            format!("{} ({}): {}", path, status, body),
        )),
        _ => Err(SoberError::Network(format!(
            "Firestore error {} for {}: {}",
            status, path, body
        ))),
    }
}

impl DocumentClient for FirestoreClient {
    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>> {
        let raw = self.list_raw(collection).await?;
        Ok(raw.iter().map(decode_document).collect())
    }

    async fn get_document(&self, path: &str) -> Result<Option<Value>> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, path).await?;
        let body: Value = response.json().await?;
        Ok(Some(decode_document(&body)))
    }

    async fn set_document(&self, path: &str, value: &Value, merge: bool) -> Result<()> {
        let fields = match encode_value(value) {
            Value::Object(mut typed) => typed
                .remove("mapValue")
                .and_then(|mut m| m.get_mut("fields").map(Value::take))
                .unwrap_or_else(|| Value::Object(Map::new())),
            _ => {
                return Err(SoberError::Invalid(format!(
                    "document {} must be a JSON object",
                    path
                )))
            }
        };

        let mut request = self.request(reqwest::Method::PATCH, path);
        if merge {
            // Only the listed fields are written; everything else is kept
            if let Some(obj) = value.as_object() {
                let mask: Vec<(&str, &str)> = obj
                    .keys()
                    .map(|k| ("updateMask.fieldPaths", k.as_str()))
                    .collect();
                request = request.query(&mask);
            }
        }

        let response = request
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;
        check_status(response, path).await?;
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<()> {
        let response = self.request(reqwest::Method::DELETE, path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response, path).await?;
        Ok(())
    }

    fn watch(&self, collection: &str) -> watch::Receiver<u64> {
        let (tx, rx) = watch::channel(0u64);
        let client = self.clone();
        let collection = collection.to_string();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(client.poll_interval);
            let mut last: Option<u64> = None;
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = interval.tick() => {
                        match client.list_raw(&collection).await {
                            Ok(docs) => {
                                let current = fingerprint(&docs);
                                if last.is_some_and(|prev| prev != current) {
                                    tx.send_modify(|v| *v = v.wrapping_add(1));
                                }
                                last = Some(current);
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, collection = %collection, "change poll failed");
                            }
                        }
                    }
                }
            }
            tracing::debug!(collection = %collection, "change poll stopped");
        });

        rx
    }
}

/// Stable digest of a collection listing (names + update times + fields)
fn fingerprint(documents: &[Value]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for doc in documents {
        doc.to_string().hash(&mut hasher);
    }
    hasher.finish()
}

/// Plain JSON → Firestore typed value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => serde_json::json!({ "nullValue": null }),
        Value::Bool(b) => serde_json::json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => serde_json::json!({ "integerValue": i.to_string() }),
            None => serde_json::json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => serde_json::json!({ "stringValue": s }),
        Value::Array(items) => {
            if items.is_empty() {
                serde_json::json!({ "arrayValue": {} })
            } else {
                let values: Vec<Value> = items.iter().map(encode_value).collect();
                serde_json::json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(obj) => {
            let fields: Map<String, Value> = obj
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            serde_json::json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Firestore typed value → plain JSON; unsupported kinds become null
pub fn decode_value(typed: &Value) -> Value {
    let Some((kind, inner)) = typed.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or(false)),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map(Value::from)
            .unwrap_or(Value::Null),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => decode_fields(inner.get("fields")),
        _ => Value::Null,
    }
}

fn decode_fields(fields: Option<&Value>) -> Value {
    let obj: Map<String, Value> = fields
        .and_then(Value::as_object)
        .map(|f| f.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
        .unwrap_or_default();
    Value::Object(obj)
}

/// A document resource's fields as a plain JSON object
pub fn decode_document(document: &Value) -> Value {
    decode_fields(document.get("fields"))
}
