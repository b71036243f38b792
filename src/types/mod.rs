//! Type definitions for soberstats

mod error;
mod daily_log;
mod medication;
mod settings;

pub use error::*;
pub use daily_log::*;
pub use medication::*;
pub use settings::*;

/// Non-fatal store warning surfaced to the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    /// Stored file was corrupted (invalid JSON) and was treated as empty
    Corrupted(String),
    /// Remote store denied a read; defaults are in use
    PermissionDenied(String),
}

impl StoreWarning {
    pub fn message(&self) -> &str {
        match self {
            StoreWarning::Corrupted(msg) | StoreWarning::PermissionDenied(msg) => msg,
        }
    }
}
