//! Device-local store: two JSON files in the data directory
//!
//! `soberstats_logs.json` holds a flat array (deduplicated by id, newest
//! date first) and `soberstats_settings.json` a single settings object.
//! Writes are read-modify-write under an exclusive lock and land via
//! temp file + rename. A corrupted file is treated as absent, never as an
//! error on the read path.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use tokio::sync::watch;

use super::{LogStore, Scope, Subscription};
use crate::types::{sort_newest_first, DailyLog, Result, SoberError, StoreWarning, UserSettings};

const LOGS_FILE: &str = "soberstats_logs.json";
const SETTINGS_FILE: &str = "soberstats_settings.json";
const LOCK_FILE: &str = ".soberstats.lock";

pub struct LocalStore {
    dir: PathBuf,
    /// Bumped after every log write; drives subscriptions
    changes: Arc<watch::Sender<u64>>,
}

impl LocalStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        let (changes, _) = watch::channel(0);
        Ok(Self {
            dir,
            changes: Arc::new(changes),
        })
    }

    pub fn logs_path(&self) -> PathBuf {
        self.dir.join(LOGS_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    /// All logs, newest first, plus a warning if the file was unreadable
    pub fn load_logs(&self) -> (Vec<DailyLog>, Option<StoreWarning>) {
        match self.shared_lock() {
            Ok(lock) => {
                let result = read_logs_file(&self.logs_path());
                let _ = lock.unlock();
                result
            }
            Err(e) => (
                Vec::new(),
                Some(StoreWarning::Corrupted(format!(
                    "Failed to acquire read lock: {}",
                    e
                ))),
            ),
        }
    }

    /// Insert or replace by id; returns the updated collection
    pub fn save_log(&self, log: &DailyLog) -> Result<Vec<DailyLog>> {
        let logs = self.modify_logs(|logs| {
            match logs.iter_mut().find(|l| l.id == log.id) {
                Some(existing) => *existing = log.clone(),
                None => logs.push(log.clone()),
            }
        })?;
        tracing::debug!(id = %log.id, date = %log.date, "saved local log");
        Ok(logs)
    }

    /// Remove by id (no-op if absent); returns the updated collection
    pub fn delete_log(&self, id: &str) -> Result<Vec<DailyLog>> {
        let logs = self.modify_logs(|logs| logs.retain(|l| l.id != id))?;
        tracing::debug!(id, "deleted local log");
        Ok(logs)
    }

    /// Stored settings; a corrupted file is removed and reported as absent
    pub fn load_settings(&self) -> Option<UserSettings> {
        let path = self.settings_path();
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "corrupted settings file, resetting");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    pub fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        let lock = self.exclusive_lock()?;
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| SoberError::Store(format!("Serialization failed: {}", e)))?;
        let result = write_atomic(&self.settings_path(), &content);
        let _ = lock.unlock();
        result
    }

    /// Remove both files
    pub fn reset(&self) -> Result<()> {
        let lock = self.exclusive_lock()?;
        for path in [self.logs_path(), self.settings_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        let _ = lock.unlock();
        self.notify();
        tracing::info!(dir = %self.dir.display(), "local data cleared");
        Ok(())
    }

    fn modify_logs<F>(&self, f: F) -> Result<Vec<DailyLog>>
    where
        F: FnOnce(&mut Vec<DailyLog>),
    {
        let lock = self.exclusive_lock()?;
        let (mut logs, warning) = read_logs_file(&self.logs_path());
        if let Some(w) = warning {
            tracing::warn!(warning = w.message(), "overwriting unreadable logs file");
        }

        f(&mut logs);
        dedup_by_id(&mut logs);
        sort_newest_first(&mut logs);

        let content = serde_json::to_string_pretty(&logs)
            .map_err(|e| SoberError::Store(format!("Serialization failed: {}", e)))?;
        let result = write_atomic(&self.logs_path(), &content);
        let _ = lock.unlock();
        result?;

        self.notify();
        Ok(logs)
    }

    fn notify(&self) {
        self.changes.send_modify(|v| *v = v.wrapping_add(1));
    }

    fn lock_file(&self) -> Result<File> {
        fs::create_dir_all(&self.dir)?;
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE))?)
    }

    fn shared_lock(&self) -> Result<File> {
        let file = self.lock_file()?;
        file.lock_shared()
            .map_err(|e| SoberError::Store(format!("Failed to acquire read lock: {}", e)))?;
        Ok(file)
    }

    fn exclusive_lock(&self) -> Result<File> {
        let file = self.lock_file()?;
        file.lock_exclusive()
            .map_err(|e| SoberError::Store(format!("Failed to acquire write lock: {}", e)))?;
        Ok(file)
    }
}

/// Keep the last occurrence of each id
fn dedup_by_id(logs: &mut Vec<DailyLog>) {
    let mut seen = std::collections::HashSet::new();
    let mut kept: Vec<DailyLog> = Vec::with_capacity(logs.len());
    for log in logs.drain(..).rev() {
        if seen.insert(log.id.clone()) {
            kept.push(log);
        }
    }
    kept.reverse();
    *logs = kept;
}

fn read_logs_file(path: &Path) -> (Vec<DailyLog>, Option<StoreWarning>) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (Vec::new(), None),
        Err(e) => {
            return (
                Vec::new(),
                Some(StoreWarning::Corrupted(format!("Failed to read logs: {}", e))),
            )
        }
    };

    match serde_json::from_str::<Vec<DailyLog>>(&content) {
        Ok(mut logs) => {
            sort_newest_first(&mut logs);
            (logs, None)
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "corrupted logs file, treating as empty");
            (
                Vec::new(),
                Some(StoreWarning::Corrupted(format!("Corrupted logs file: {}", e))),
            )
        }
    }
}

/// Temp file + fsync + rename
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    {
        let mut file = File::create(&temp_path)
            .map_err(|e| SoberError::Store(format!("Failed to create temp file: {}", e)))?;
        file.write_all(content.as_bytes())
            .map_err(|e| SoberError::Store(format!("Failed to write temp file: {}", e)))?;
        file.sync_all()
            .map_err(|e| SoberError::Store(format!("Failed to sync temp file: {}", e)))?;
    }
    fs::rename(&temp_path, path)
        .map_err(|e| SoberError::Store(format!("Failed to rename temp file: {}", e)))?;
    Ok(())
}

impl LogStore for LocalStore {
    async fn list(&self, _scope: &Scope) -> Result<Vec<DailyLog>> {
        let (logs, _warning) = self.load_logs();
        Ok(logs)
    }

    fn subscribe<F>(&self, _scope: &Scope, mut handler: F) -> Result<Subscription>
    where
        F: FnMut(Vec<DailyLog>) + Send + 'static,
    {
        let mut rx = self.changes.subscribe();
        let path = self.logs_path();
        let task = tokio::spawn(async move {
            loop {
                let (logs, _warning) = read_logs_file(&path);
                handler(logs);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        Ok(Subscription::new(task))
    }

    async fn upsert(&self, _scope: &Scope, log: &DailyLog) -> Result<()> {
        self.save_log(log).map(|_| ())
    }

    async fn delete(&self, _scope: &Scope, id: &str) -> Result<()> {
        self.delete_log(id).map(|_| ())
    }

    async fn get_settings(&self, _scope: &Scope) -> Result<Option<UserSettings>> {
        Ok(self.load_settings())
    }

    async fn set_settings(&self, _scope: &Scope, settings: &UserSettings) -> Result<()> {
        self.save_settings(settings)
    }
}
