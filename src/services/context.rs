//! Application context: who is signed in, where logs live, current settings
//!
//! Built once at startup by [`AppContext::init`]; the CLI and TUI both go
//! through it instead of touching a backend directly.

use crate::config::Config;
use crate::services::auth::{resolve_session, Session};
use crate::store::{FirestoreClient, LocalStore, LogStore, RemoteStore, Scope, StoreBackend, Subscription};
use crate::types::{DailyLog, Result, SoberError, UserSettings};

pub struct AppContext {
    scope: Scope,
    store: StoreBackend,
    settings: UserSettings,
    warning: Option<String>,
    session: Option<Session>,
    subscriptions: Vec<Subscription>,
}

impl AppContext {
    /// Resolve the session, select the backend and load settings.
    ///
    /// Only a configuration problem is fatal; denied or broken settings
    /// reads fall back to defaults and leave a warning.
    pub async fn init(config: &Config) -> Result<Self> {
        let session = resolve_session(config).await?;

        let (scope, store) = match (&session, &config.firebase) {
            (Some(session), Some(firebase)) => {
                let client =
                    FirestoreClient::new(firebase, session.id_token.clone(), config.poll_interval);
                (
                    Scope::User(session.uid.clone()),
                    StoreBackend::Cloud(RemoteStore::new(client)),
                )
            }
            _ => (
                Scope::Device,
                StoreBackend::Local(LocalStore::new(config.data_dir.clone())?),
            ),
        };
        tracing::info!(backend = store.label(), "store selected");

        let mut ctx = Self::with_store(scope, store);
        ctx.session = session;
        ctx.reload_settings().await;
        Ok(ctx)
    }

    /// Context over an already-built backend with default settings
    pub fn with_store(scope: Scope, store: StoreBackend) -> Self {
        Self {
            scope,
            store,
            settings: UserSettings::default(),
            warning: None,
            session: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn store(&self) -> &StoreBackend {
        &self.store
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    /// Non-fatal problem worth showing the user
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Settings from the store, or defaults (with a warning on failure)
    pub async fn reload_settings(&mut self) {
        self.settings = match self.store.get_settings(&self.scope).await {
            Ok(Some(settings)) => settings,
            Ok(None) => UserSettings::default(),
            Err(SoberError::PermissionDenied(msg)) => {
                tracing::warn!(error = %msg, "settings read denied, using defaults");
                self.warning = Some(format!(
                    "Cloud access was denied ({}). Using default settings.",
                    msg
                ));
                UserSettings::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "settings read failed, using defaults");
                self.warning = Some(format!("Could not load settings: {}", e));
                UserSettings::default()
            }
        };
    }

    /// All logs, newest first.
    ///
    /// A denied cloud read is not fatal: it yields no logs and leaves a
    /// warning behind.
    pub async fn logs(&mut self) -> Result<Vec<DailyLog>> {
        match self.store.list(&self.scope).await {
            Err(SoberError::PermissionDenied(msg)) => {
                tracing::warn!(error = %msg, "log read denied, showing no logs");
                self.warning = Some(format!(
                    "Cloud access was denied ({}). No logs can be shown.",
                    msg
                ));
                Ok(Vec::new())
            }
            result => result,
        }
    }

    /// Register a live log feed; it is cancelled on scope switch or shutdown
    pub fn subscribe_logs<F>(&mut self, handler: F) -> Result<()>
    where
        F: FnMut(Vec<DailyLog>) + Send + 'static,
    {
        let subscription = self.store.subscribe(&self.scope, handler)?;
        self.subscriptions.push(subscription);
        Ok(())
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.iter().filter(|s| s.is_active()).count()
    }

    /// Family mode makes the shell read-only
    fn ensure_writable(&self) -> Result<()> {
        if self.settings.family_mode {
            return Err(SoberError::Invalid(
                "family mode is on: logs are read-only (turn it off with `settings set --family-mode false`)"
                    .into(),
            ));
        }
        Ok(())
    }

    pub async fn save_log(&self, log: &DailyLog) -> Result<()> {
        self.ensure_writable()?;
        log.validate()?;
        self.store.upsert(&self.scope, log).await
    }

    pub async fn delete_log(&self, id: &str) -> Result<()> {
        self.ensure_writable()?;
        self.store.delete(&self.scope, id).await
    }

    pub async fn save_settings(&mut self, settings: UserSettings) -> Result<()> {
        self.store.set_settings(&self.scope, &settings).await?;
        self.settings = settings;
        Ok(())
    }

    /// Move to another scope/backend; live subscriptions of the old one end
    pub async fn switch_scope(&mut self, scope: Scope, store: StoreBackend) {
        self.cancel_subscriptions();
        self.scope = scope;
        self.store = store;
        self.warning = None;
        self.reload_settings().await;
    }

    pub fn shutdown(&mut self) {
        self.cancel_subscriptions();
    }

    fn cancel_subscriptions(&mut self) {
        let count = self.subscriptions.len();
        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
        if count > 0 {
            tracing::debug!(count, "cancelled subscriptions");
        }
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
