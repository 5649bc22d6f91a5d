//! Generative gateway session proposer
//!
//! Sends the plan request to an OpenAI-compatible chat-completions service
//! and parses session candidates out of the reply. The model is asked for
//! strict JSON, but replies routinely arrive wrapped in markdown code
//! fences or prose, so extraction tolerates both. Everything parsed here is
//! still untrusted; the normalizer applies the schedule contract afterward.

use crate::config::GatewayConfig;
use crate::error::{ExamplanError, Result};
use crate::proposers::{ProposerKind, SessionProposer};
use crate::types::{PlanRequest, SessionCandidate};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a study planning assistant. Given exam \
deadlines, a daily study budget, and a preferred time of day, produce a \
study schedule. Respond with JSON only: an object with a \"sessions\" array \
where each entry has subject, title, start_time, end_time, study_method \
(one of review, practice, new_material), and break_interval_minutes. All \
times must be RFC 3339 timestamps inside the preferred window and no \
session may start after its subject's exam.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Proposer backed by a chat-completions gateway
pub struct GatewayProposer {
    config: GatewayConfig,
    client: reqwest::Client,
    fence_pattern: Regex,
}

impl GatewayProposer {
    /// Create a gateway proposer from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let fence_pattern = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```")
            .map_err(|e| ExamplanError::Config(format!("Invalid fence pattern: {}", e)))?;
        Ok(Self {
            config,
            client,
            fence_pattern,
        })
    }

    /// Describe the request for the model
    fn user_prompt(request: &PlanRequest) -> String {
        let mut prompt = format!(
            "Plan study sessions from {} to {} with {} hours available per day \
             during the {} window.\nExams:\n",
            request.range_start,
            request.range_end,
            request.daily_study_hours,
            request.preferred_window.label()
        );
        for deadline in &request.deadlines {
            prompt.push_str(&format!(
                "- {} ({}): {} priority, exam at {}\n",
                deadline.subject,
                deadline.title,
                deadline.priority.label(),
                deadline.exam_date.to_rfc3339()
            ));
        }
        prompt
    }

    /// Strip a markdown code fence from the reply, if present
    fn extract_payload<'a>(&self, content: &'a str) -> &'a str {
        self.fence_pattern
            .captures(content)
            .and_then(|captures| captures.get(1))
            .map(|inner| inner.as_str())
            .unwrap_or(content)
            .trim()
    }

    /// Parse session candidates from the extracted payload
    ///
    /// Accepts either an object with a `sessions` array or a bare array.
    fn parse_candidates(payload: &str) -> Result<Vec<SessionCandidate>> {
        let value: JsonValue = serde_json::from_str(payload).map_err(|e| {
            ExamplanError::MalformedUpstream(format!("reply is not valid JSON: {}", e))
        })?;
        let sessions = match value {
            JsonValue::Array(_) => value,
            JsonValue::Object(mut object) => object.remove("sessions").ok_or_else(|| {
                ExamplanError::MalformedUpstream("reply has no 'sessions' array".to_string())
            })?,
            _ => {
                return Err(ExamplanError::MalformedUpstream(
                    "reply is neither an object nor an array".to_string(),
                )
                .into())
            }
        };
        serde_json::from_value(sessions).map_err(|e| {
            ExamplanError::MalformedUpstream(format!("session entries are malformed: {}", e))
                .into()
        })
    }
}

#[async_trait]
impl SessionProposer for GatewayProposer {
    fn kind(&self) -> ProposerKind {
        ProposerKind::Generative
    }

    async fn propose(&self, request: &PlanRequest) -> Result<Vec<SessionCandidate>> {
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::user_prompt(request),
                },
            ],
            temperature: self.config.temperature,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        tracing::debug!("Requesting plan draft from {}", url);

        let mut http_request = self.client.post(&url).json(&body);
        if let Ok(key) = std::env::var(&self.config.api_key_env) {
            if !key.is_empty() {
                http_request = http_request.bearer_auth(key);
            }
        }

        let response = http_request.send().await.map_err(|e| {
            ExamplanError::UpstreamUnavailable(format!("request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ExamplanError::RateLimited(
                "the plan generator is receiving too many requests, try again shortly"
                    .to_string(),
            )
            .into());
        }
        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            return Err(ExamplanError::FeatureGated(
                "AI plan generation requires available credits. Upgrade to premium to continue."
                    .to_string(),
            )
            .into());
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExamplanError::UpstreamUnavailable(format!(
                "gateway returned {}: {}",
                status, detail
            ))
            .into());
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            ExamplanError::MalformedUpstream(format!("reply envelope is malformed: {}", e))
        })?;
        let content = reply
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| {
                ExamplanError::MalformedUpstream("reply has no choices".to_string())
            })?;

        let candidates = Self::parse_candidates(self.extract_payload(content))?;
        tracing::debug!("Gateway proposed {} session candidates", candidates.len());
        Ok(candidates)
    }
}
