//! Email/password accounts against the Firebase identity REST API
//!
//! A successful sign-in is persisted to `session.json` in the data
//! directory; later runs pick it up, refreshing the id token when it is
//! close to expiry. Resolving the current user is bounded by
//! [`AUTH_TIMEOUT`]: anything slower proceeds unauthenticated.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{Config, FirebaseConfig};
use crate::types::{Result, SoberError};

/// Ceiling on the startup auth check
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(6);

const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";

const SESSION_FILE: &str = "session.json";

/// Refresh this many seconds before the token actually expires
const REFRESH_MARGIN_SECS: i64 = 60;

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired(&self, now: i64) -> bool {
        now + REFRESH_MARGIN_SECS >= self.expires_at
    }
}

/// Response of `accounts:signInWithPassword` / `accounts:signUp`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// Response of the token refresh endpoint (snake_case on the wire)
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

fn expiry_from(expires_in: &str) -> i64 {
    let secs = expires_in.parse::<i64>().unwrap_or(3600);
    Utc::now().timestamp() + secs
}

/// Path of the persisted session inside `data_dir`
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE)
}

/// Remove the stored session; returns whether one existed
pub fn clear_session(data_dir: &Path) -> Result<bool> {
    let path = session_path(data_dir);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path)?;
    tracing::info!("signed out");
    Ok(true)
}

pub struct AuthService {
    http: reqwest::Client,
    api_key: String,
    identity_url: String,
    token_url: String,
    session_path: PathBuf,
}

impl AuthService {
    pub fn new(firebase: &FirebaseConfig, data_dir: &Path) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: firebase.api_key.clone(),
            identity_url: IDENTITY_BASE_URL.to_string(),
            token_url: TOKEN_BASE_URL.to_string(),
            session_path: session_path(data_dir),
        }
    }

    /// Point both endpoints at another host (emulator, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.identity_url = base_url.clone();
        self.token_url = base_url;
        self
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.account_request("accounts:signInWithPassword", email, password)
            .await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        self.account_request("accounts:signUp", email, password).await
    }

    async fn account_request(&self, endpoint: &str, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/{}", self.identity_url, endpoint);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;
        let body: AccountResponse = parse_response(response).await?;

        let session = Session {
            uid: body.local_id,
            email: body.email.or_else(|| Some(email.to_string())),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expiry_from(&body.expires_in),
        };
        self.save_session(&session)?;
        tracing::info!(uid = %session.uid, "signed in");
        Ok(session)
    }

    /// Exchange the refresh token for a fresh id token
    pub async fn refresh(&self, session: &Session) -> Result<Session> {
        let url = format!("{}/token", self.token_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": session.refresh_token,
            }))
            .send()
            .await?;
        let body: RefreshResponse = parse_response(response).await?;

        let refreshed = Session {
            uid: body.user_id,
            email: session.email.clone(),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expiry_from(&body.expires_in),
        };
        self.save_session(&refreshed)?;
        tracing::debug!(uid = %refreshed.uid, "refreshed id token");
        Ok(refreshed)
    }

    pub fn load_session(&self) -> Option<Session> {
        let content = fs::read_to_string(&self.session_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "corrupted session file, signing out");
                let _ = fs::remove_file(&self.session_path);
                None
            }
        }
    }

    fn save_session(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.session_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.session_path, content)?;
        Ok(())
    }

    /// Stored session with a usable token, or `None` on any failure
    pub async fn current_user(&self) -> Option<Session> {
        let session = self.load_session()?;
        if !session.is_expired(Utc::now().timestamp()) {
            return Some(session);
        }
        match self.refresh(&session).await {
            Ok(fresh) => Some(fresh),
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, continuing signed out");
                None
            }
        }
    }
}

/// Decode a success body, or turn the API's error message into an auth error
async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let message = body["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());
    Err(SoberError::Auth(message))
}

/// Startup auth check: the signed-in user, if any, within [`AUTH_TIMEOUT`].
///
/// A stored session without cloud configuration is a configuration error;
/// every other failure (including the timeout) means "signed out".
pub async fn resolve_session(config: &Config) -> Result<Option<Session>> {
    if !session_path(&config.data_dir).exists() {
        return Ok(None);
    }
    let firebase = config.require_firebase()?;
    let auth = AuthService::new(firebase, &config.data_dir);

    match tokio::time::timeout(AUTH_TIMEOUT, auth.current_user()).await {
        Ok(session) => Ok(session),
        Err(_) => {
            tracing::warn!(
                timeout_secs = AUTH_TIMEOUT.as_secs(),
                "auth check timed out, continuing signed out"
            );
            Ok(None)
        }
    }
}
