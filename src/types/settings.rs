//! Per-scope user settings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::SoberError;

/// Color theme selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeName {
    #[default]
    RedAlert,
    Noir,
    Synthwave,
}

impl ThemeName {
    pub const ALL: [ThemeName; 3] = [ThemeName::RedAlert, ThemeName::Noir, ThemeName::Synthwave];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RedAlert => "red_alert",
            Self::Noir => "noir",
            Self::Synthwave => "synthwave",
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeName {
    type Err = SoberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                SoberError::Invalid(format!(
                    "unknown theme {:?} (expected red_alert, noir or synthwave)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub name: String,
    /// Read-only gate for the shell; not enforced by any store
    #[serde(default)]
    pub family_mode: bool,
    /// Declared but not wired to any lock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub theme: ThemeName,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            name: "User".to_string(),
            family_mode: false,
            password: None,
            theme: ThemeName::RedAlert,
        }
    }
}
