//! Per-user cloud store over a document database
//!
//! Layout under a user id `uid`:
//!
//! ```text
//! users/{uid}/logs/{log_id}      one document per DailyLog
//! users/{uid}/settings/config    the UserSettings document
//! ```
//!
//! The database itself sits behind [`DocumentClient`] so the same store
//! logic runs against the hosted REST API and an in-process database in
//! tests.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::{LogStore, Scope, Subscription};
use crate::types::{sort_newest_first, DailyLog, Result, SoberError, UserSettings};

/// Minimal document-database surface used by [`RemoteStore`]
///
/// Documents are plain JSON objects; paths are slash-separated
/// (`collection/doc/collection/doc`).
pub trait DocumentClient: Send + Sync + 'static {
    /// All documents directly under `collection`
    fn list_documents(&self, collection: &str)
        -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// `None` when the document does not exist
    fn get_document(&self, path: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Replace the document, or with `merge` overwrite only the given top-level fields
    fn set_document(
        &self,
        path: &str,
        value: &Value,
        merge: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Deleting a missing document is not an error
    fn delete_document(&self, path: &str) -> impl Future<Output = Result<()>> + Send;

    /// Version counter for `collection`, bumped whenever its documents change.
    /// The feed stops once every receiver is dropped.
    fn watch(&self, collection: &str) -> watch::Receiver<u64>;
}

pub fn logs_collection(uid: &str) -> String {
    format!("users/{}/logs", uid)
}

pub fn log_path(uid: &str, id: &str) -> String {
    format!("users/{}/logs/{}", uid, id)
}

pub fn settings_path(uid: &str) -> String {
    format!("users/{}/settings/config", uid)
}

pub struct RemoteStore<C> {
    client: Arc<C>,
}

impl<C: DocumentClient> RemoteStore<C> {
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

/// Cloud operations need a signed-in user
fn require_user(scope: &Scope) -> Result<&str> {
    scope
        .user_id()
        .ok_or_else(|| SoberError::Auth("cloud store requires a signed-in user".into()))
}

/// Decode documents into logs, skipping (and logging) malformed ones
fn decode_logs(documents: Vec<Value>) -> Vec<DailyLog> {
    let mut logs: Vec<DailyLog> = documents
        .into_iter()
        .filter_map(|doc| match serde_json::from_value::<DailyLog>(doc) {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed log document");
                None
            }
        })
        .collect();
    sort_newest_first(&mut logs);
    logs
}

async fn fetch_logs<C: DocumentClient>(client: &C, uid: &str) -> Result<Vec<DailyLog>> {
    let documents = client.list_documents(&logs_collection(uid)).await?;
    Ok(decode_logs(documents))
}

impl<C: DocumentClient> LogStore for RemoteStore<C> {
    async fn list(&self, scope: &Scope) -> Result<Vec<DailyLog>> {
        let uid = require_user(scope)?;
        fetch_logs(self.client.as_ref(), uid).await
    }

    fn subscribe<F>(&self, scope: &Scope, mut handler: F) -> Result<Subscription>
    where
        F: FnMut(Vec<DailyLog>) + Send + 'static,
    {
        let uid = require_user(scope)?.to_string();
        let client = Arc::clone(&self.client);
        let mut changes = client.watch(&logs_collection(&uid));

        let task = tokio::spawn(async move {
            loop {
                match fetch_logs(client.as_ref(), &uid).await {
                    Ok(logs) => handler(logs),
                    // Denied reads look like an empty collection
                    Err(SoberError::PermissionDenied(msg)) => {
                        tracing::warn!(error = %msg, uid = %uid, "log subscription denied");
                        handler(Vec::new());
                    }
                    Err(e) => tracing::warn!(error = %e, uid = %uid, "log subscription refresh failed"),
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });
        Ok(Subscription::new(task))
    }

    async fn upsert(&self, scope: &Scope, log: &DailyLog) -> Result<()> {
        let uid = require_user(scope)?;
        let value = serde_json::to_value(log)?;
        // Full replace so cleared optional fields disappear
        self.client
            .set_document(&log_path(uid, &log.id), &value, false)
            .await?;
        tracing::debug!(id = %log.id, date = %log.date, "saved cloud log");
        Ok(())
    }

    async fn delete(&self, scope: &Scope, id: &str) -> Result<()> {
        let uid = require_user(scope)?;
        self.client.delete_document(&log_path(uid, id)).await
    }

    async fn get_settings(&self, scope: &Scope) -> Result<Option<UserSettings>> {
        let uid = require_user(scope)?;
        match self.client.get_document(&settings_path(uid)).await? {
            Some(doc) => match serde_json::from_value(doc) {
                Ok(settings) => Ok(Some(settings)),
                Err(e) => {
                    tracing::warn!(error = %e, "malformed cloud settings, using defaults");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn set_settings(&self, scope: &Scope, settings: &UserSettings) -> Result<()> {
        let uid = require_user(scope)?;
        let value = serde_json::to_value(settings)?;
        self.client
            .set_document(&settings_path(uid), &value, true)
            .await
    }
}
