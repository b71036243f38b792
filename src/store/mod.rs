//! Log persistence: one capability set, two backends
//!
//! - [`LocalStore`]: JSON files on this device, synchronous underneath
//! - [`RemoteStore`]: per-user cloud documents with a change feed
//!
//! The backend is picked once (see `services::context`) and wrapped in
//! [`StoreBackend`], so callers never branch on where data lives.

mod firestore;
mod local;
#[cfg(test)]
mod memory;
mod remote;

pub use firestore::FirestoreClient;
pub use local::LocalStore;
#[cfg(test)]
pub use memory::MemoryDocuments;
pub use remote::{DocumentClient, RemoteStore};

use std::future::Future;

use tokio::task::JoinHandle;

use crate::types::{DailyLog, Result, UserSettings};

/// Whose data an operation addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Unauthenticated, this device only
    Device,
    /// Signed-in cloud user
    User(String),
}

impl Scope {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Scope::Device => None,
            Scope::User(uid) => Some(uid),
        }
    }
}

/// Handle to a live log subscription.
///
/// The background task stops on [`Subscription::cancel`] or when the handle
/// is dropped, so a subscription never outlives its owner.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn cancel(self) {
        // Drop aborts
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Persistence operations shared by both backends
pub trait LogStore: Send + Sync {
    /// Snapshot of all logs, newest date first
    fn list(&self, scope: &Scope) -> impl Future<Output = Result<Vec<DailyLog>>> + Send;

    /// Push the full newest-first collection now and after every change
    fn subscribe<F>(&self, scope: &Scope, handler: F) -> Result<Subscription>
    where
        F: FnMut(Vec<DailyLog>) + Send + 'static;

    /// Insert, or replace the record with the same id
    fn upsert(&self, scope: &Scope, log: &DailyLog) -> impl Future<Output = Result<()>> + Send;

    /// Remove by id; absent ids are a no-op
    fn delete(&self, scope: &Scope, id: &str) -> impl Future<Output = Result<()>> + Send;

    fn get_settings(
        &self,
        scope: &Scope,
    ) -> impl Future<Output = Result<Option<UserSettings>>> + Send;

    fn set_settings(
        &self,
        scope: &Scope,
        settings: &UserSettings,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The backend selected at startup
pub enum StoreBackend {
    Local(LocalStore),
    Cloud(RemoteStore<FirestoreClient>),
    /// Cloud code path over an in-process database
    #[cfg(test)]
    Memory(RemoteStore<MemoryDocuments>),
}

impl StoreBackend {
    pub fn is_cloud(&self) -> bool {
        !matches!(self, StoreBackend::Local(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            StoreBackend::Local(_) => "local",
            StoreBackend::Cloud(_) => "cloud",
            #[cfg(test)]
            StoreBackend::Memory(_) => "memory",
        }
    }
}

impl LogStore for StoreBackend {
    async fn list(&self, scope: &Scope) -> Result<Vec<DailyLog>> {
        match self {
            StoreBackend::Local(s) => s.list(scope).await,
            StoreBackend::Cloud(s) => s.list(scope).await,
            #[cfg(test)]
            StoreBackend::Memory(s) => s.list(scope).await,
        }
    }

    fn subscribe<F>(&self, scope: &Scope, handler: F) -> Result<Subscription>
    where
        F: FnMut(Vec<DailyLog>) + Send + 'static,
    {
        match self {
            StoreBackend::Local(s) => s.subscribe(scope, handler),
            StoreBackend::Cloud(s) => s.subscribe(scope, handler),
            #[cfg(test)]
            StoreBackend::Memory(s) => s.subscribe(scope, handler),
        }
    }

    async fn upsert(&self, scope: &Scope, log: &DailyLog) -> Result<()> {
        match self {
            StoreBackend::Local(s) => s.upsert(scope, log).await,
            StoreBackend::Cloud(s) => s.upsert(scope, log).await,
            #[cfg(test)]
            StoreBackend::Memory(s) => s.upsert(scope, log).await,
        }
    }

    async fn delete(&self, scope: &Scope, id: &str) -> Result<()> {
        match self {
            StoreBackend::Local(s) => s.delete(scope, id).await,
            StoreBackend::Cloud(s) => s.delete(scope, id).await,
            #[cfg(test)]
            StoreBackend::Memory(s) => s.delete(scope, id).await,
        }
    }

    async fn get_settings(&self, scope: &Scope) -> Result<Option<UserSettings>> {
        match self {
            StoreBackend::Local(s) => s.get_settings(scope).await,
            StoreBackend::Cloud(s) => s.get_settings(scope).await,
            #[cfg(test)]
            StoreBackend::Memory(s) => s.get_settings(scope).await,
        }
    }

    async fn set_settings(&self, scope: &Scope, settings: &UserSettings) -> Result<()> {
        match self {
            StoreBackend::Local(s) => s.set_settings(scope, settings).await,
            StoreBackend::Cloud(s) => s.set_settings(scope, settings).await,
            #[cfg(test)]
            StoreBackend::Memory(s) => s.set_settings(scope, settings).await,
        }
    }
}
