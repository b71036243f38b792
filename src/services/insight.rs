//! Narrative summary of the last seven logs via a generative-text API
//!
//! The request is a fixed instruction prompt wrapped around a one-line
//! summary per log. Failures never propagate: callers always get text back,
//! either the model's answer or one of two fixed fallback strings.

use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::services::aggregator::PERIOD_LEN;
use crate::types::{find_medication, sort_newest_first, DailyLog, Result, SoberError};

/// Returned when no API key is configured
pub const FALLBACK_NOT_CONFIGURED: &str =
    "AI analysis is offline (no API key configured). Keep logging; your trends are still tracked.";

/// Returned when the service call fails
pub const FALLBACK_UNAVAILABLE: &str =
    "Unable to generate insights at this moment. Stay strong and keep tracking.";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the insight text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Generated,
    NotConfigured,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub text: String,
    pub source: InsightSource,
}

impl Insight {
    fn fallback(source: InsightSource) -> Self {
        let text = match source {
            InsightSource::NotConfigured => FALLBACK_NOT_CONFIGURED,
            _ => FALLBACK_UNAVAILABLE,
        };
        Self {
            text: text.to_string(),
            source,
        }
    }
}

/// Σ(amount × diazepam equivalence) over catalog medications
pub fn diazepam_equivalent(log: &DailyLog) -> f64 {
    log.medications
        .iter()
        .filter_map(|m| find_medication(&m.medication_id).map(|r| m.amount * r.diazepam_equivalence))
        .sum()
}

/// One line per log for the most recent seven logs, newest first
pub fn build_log_summary(logs: &[DailyLog]) -> String {
    let mut recent = logs.to_vec();
    sort_newest_first(&mut recent);
    recent.truncate(PERIOD_LEN);

    recent
        .iter()
        .map(|log| {
            let alcohol = if log.alcohol_consumed {
                format!("{} units", log.alcohol_units)
            } else {
                "None".to_string()
            };
            let meds = log
                .medications
                .iter()
                .map(|m| {
                    let name = find_medication(&m.medication_id)
                        .map(|r| r.name)
                        .unwrap_or(m.medication_id.as_str());
                    format!("{}: {}mg", name, m.amount)
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "Date: {}, Alcohol: {}, Meds: [{}], Approx Diazepam Eq: {}mg",
                log.date,
                alcohol,
                meds,
                diazepam_equivalent(log)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full instruction prompt around the log summary
pub fn build_prompt(summary: &str) -> String {
    format!(
        r#"You are a compassionate, non-judgmental recovery assistant for 'SoberStats', an app for people recovering from alcohol addiction who may be using benzodiazepines (possibly for withdrawal or maintenance).

Analyze the following 7 days of logs:
{}

Your goal is to support their sobriety from alcohol while monitoring their medication usage.

Guidelines:
1. Celebrate days without alcohol.
2. If medication usage (Diazepam Equivalent) is trending down, encourage their tapering progress.
3. If medication usage is spiking, gently remind them of the goal of stability.
4. Be vigilant for "symptom substitution" (e.g., stopping alcohol but heavily increasing benzos).
5. Brief (max 3 sentences). Casual tone. Address the user as "you".
6. DO NOT give medical advice or tell them to see a doctor in every message."#,
        summary
    )
}

/// Client for the generative-text service
pub struct InsightService {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl InsightService {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.insight_api_key.clone(), config.insight_model.clone())
    }

    /// Point at a different API root (self-hosted proxy, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Generate the narrative for `logs`; never fails
    pub async fn generate(&self, logs: &[DailyLog]) -> Insight {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("insight API key not configured, using fallback");
            return Insight::fallback(InsightSource::NotConfigured);
        };

        let prompt = build_prompt(&build_log_summary(logs));
        match self.call(api_key, &prompt).await {
            Ok(text) => Insight {
                text,
                source: InsightSource::Generated,
            },
            Err(e) => {
                tracing::warn!(error = %e, "insight service unavailable, using fallback");
                Insight::fallback(InsightSource::Unavailable)
            }
        }
    }

    async fn call(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&serde_json::json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SoberError::Network(format!(
                "insight API error {}: {}",
                status, body
            )));
        }

        let body: serde_json::Value = response.json().await?;
        extract_text(&body)
            .ok_or_else(|| SoberError::Parse("insight response contained no text".into()))
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(body: &serde_json::Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
