//! In-process document database for tests
//!
//! Same contract as the hosted one, minus the network. Backs
//! `StoreBackend::Memory` so the cloud code path runs without a server.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use serde_json::Value;
use tokio::sync::watch;

use super::remote::DocumentClient;
use crate::types::{Result, SoberError};

#[derive(Default)]
pub struct MemoryDocuments {
    documents: RwLock<BTreeMap<String, Value>>,
    feeds: Mutex<HashMap<String, watch::Sender<u64>>>,
    denied: AtomicBool,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every operation as if access rules forbade it
    pub fn deny_access(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_access(&self, path: &str) -> Result<()> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(SoberError::PermissionDenied(format!(
                "access to {} denied",
                path
            )));
        }
        Ok(())
    }

    fn notify(&self, path: &str) {
        let Some((collection, _)) = path.rsplit_once('/') else {
            return;
        };
        let feeds = self.feeds.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = feeds.get(collection) {
            tx.send_modify(|v| *v = v.wrapping_add(1));
        }
    }
}

/// Direct child of `collection` (no further nesting)
fn is_child(collection: &str, path: &str) -> bool {
    path.strip_prefix(collection)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|id| !id.is_empty() && !id.contains('/'))
}

impl DocumentClient for MemoryDocuments {
    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>> {
        self.check_access(collection)?;
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        Ok(documents
            .iter()
            .filter(|(path, _)| is_child(collection, path))
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn get_document(&self, path: &str) -> Result<Option<Value>> {
        self.check_access(path)?;
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        Ok(documents.get(path).cloned())
    }

    async fn set_document(&self, path: &str, value: &Value, merge: bool) -> Result<()> {
        self.check_access(path)?;
        {
            let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
            let merged = match (merge, value.as_object()) {
                (true, Some(fields)) => match documents.get_mut(path) {
                    Some(Value::Object(existing)) => {
                        for (key, field) in fields {
                            existing.insert(key.clone(), field.clone());
                        }
                        true
                    }
                    _ => false,
                },
                _ => false,
            };
            if !merged {
                documents.insert(path.to_string(), value.clone());
            }
        }
        self.notify(path);
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<()> {
        self.check_access(path)?;
        let removed = self
            .documents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path)
            .is_some();
        if removed {
            self.notify(path);
        }
        Ok(())
    }

    fn watch(&self, collection: &str) -> watch::Receiver<u64> {
        let mut feeds = self.feeds.lock().unwrap_or_else(|e| e.into_inner());
        feeds
            .entry(collection.to_string())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_child() {
        assert!(is_child("users/u1/logs", "users/u1/logs/a"));
        assert!(!is_child("users/u1/logs", "users/u1/logs"));
        assert!(!is_child("users/u1/logs", "users/u1/logs/a/b/c"));
        assert!(!is_child("users/u1/logs", "users/u1/logsx/a"));
    }

    #[tokio::test]
    async fn test_set_replace_vs_merge() {
        let docs = MemoryDocuments::new();
        docs.set_document("c/d", &json!({ "a": 1, "b": 2 }), false)
            .await
            .unwrap();
        docs.set_document("c/d", &json!({ "b": 3 }), true).await.unwrap();
        assert_eq!(
            docs.get_document("c/d").await.unwrap(),
            Some(json!({ "a": 1, "b": 3 }))
        );

        docs.set_document("c/d", &json!({ "b": 4 }), false).await.unwrap();
        assert_eq!(docs.get_document("c/d").await.unwrap(), Some(json!({ "b": 4 })));
    }

    #[tokio::test]
    async fn test_watch_bumps_on_change_only() {
        let docs = MemoryDocuments::new();
        let mut rx = docs.watch("c");

        docs.delete_document("c/missing").await.unwrap();
        assert!(!rx.has_changed().unwrap());

        docs.set_document("c/d", &json!({}), false).await.unwrap();
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        docs.set_document("other/d", &json!({}), false).await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_denied_access() {
        let docs = MemoryDocuments::new();
        docs.deny_access(true);
        assert!(docs.list_documents("c").await.is_err());
        docs.deny_access(false);
        assert!(docs.list_documents("c").await.unwrap().is_empty());
    }
}
