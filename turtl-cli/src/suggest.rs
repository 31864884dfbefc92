//! Time suggestions: local extraction first, then one chat-completion call.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use turtl_core::time::medium_date;
use turtl_core::{Priority, TimeExtractor};

use crate::config::AiSection;

/// The model is asked to stay under this; replies are not cut to fit.
pub const SUGGESTION_CHAR_HINT: usize = 100;

const SYSTEM_PROMPT: &str = "\
You are an AI assistant that helps users schedule their tasks optimally. Based on the task description, priority level, and deadline, suggest the best time of day to complete the task.

Consider these factors:
- High priority tasks should be done earlier in the day
- Creative tasks work better in the morning when the mind is fresh
- Administrative tasks can be done in the afternoon
- Physical tasks might be better in the morning or early afternoon
- Tasks requiring focus should avoid typical break times
- Planning and review tasks suit the evening

Respond with a concise suggestion like:
- \"Morning (9-11 AM) - Best for creative work and high priority tasks\"
- \"Afternoon (2-4 PM) - Good for administrative tasks\"
- \"Evening (6-8 PM) - Suitable for planning and review tasks\"
- \"Early morning (7-9 AM) - Ideal for important tasks requiring focus\"

Keep your response under 100 characters and be specific about the time window.";

#[async_trait]
pub trait Suggester: Send + Sync {
    /// `None` means no suggestion could be obtained at all.
    async fn suggest_time(
        &self,
        title: &str,
        priority: Priority,
        deadline: NaiveDate,
    ) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub referer: String,
    pub app_title: String,
    pub api_key: Option<String>,
}

impl SuggestionConfig {
    pub fn from_ai(ai: &AiSection, api_key: Option<String>) -> Self {
        Self {
            base_url: ai.base_url.clone(),
            model: ai.model.clone(),
            temperature: ai.temperature,
            max_tokens: ai.max_tokens,
            referer: ai.referer.clone(),
            app_title: ai.app_title.clone(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

pub fn user_prompt(title: &str, priority: Priority, deadline: NaiveDate) -> String {
    format!(
        "Task: {}\nPriority: {}\nDeadline: {}\n\nWhen is the best time to complete this task?",
        title,
        priority.name(),
        medium_date(deadline)
    )
}

/// Pull `choices[0].message.content` out of a response body.
///
/// Anything else (not JSON, an error object, a missing field) yields the
/// canned suggestion for `priority`.
pub fn parse_suggestion(body: &str, priority: Priority) -> String {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "suggestion response was not JSON; using default");
            return priority.fallback_suggestion().to_string();
        }
    };

    match parsed
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        Some(content) => content.trim().to_string(),
        None => {
            warn!("could not extract suggestion from response; using default");
            priority.fallback_suggestion().to_string()
        }
    }
}

pub struct SuggestionClient {
    http: reqwest::Client,
    config: SuggestionConfig,
    extractor: Arc<TimeExtractor>,
}

impl SuggestionClient {
    pub fn new(config: SuggestionConfig, extractor: Arc<TimeExtractor>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            extractor,
        }
    }

    async fn ask_model(&self, title: &str, priority: Priority, deadline: NaiveDate) -> Option<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(title, priority, deadline),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        // Without a key the header still goes out; the provider answers with an
        // error body and the priority default applies.
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let req = self
            .http
            .post(self.config.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.app_title);

        debug!(model = %self.config.model, %title, "requesting time suggestion");
        let resp = match req.json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "suggestion request failed");
                return None;
            }
        };

        let status = resp.status();
        let text = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                warn!(%status, error = %e, "failed to read suggestion response");
                return None;
            }
        };

        let suggestion = parse_suggestion(&text, priority);
        if suggestion.chars().count() > SUGGESTION_CHAR_HINT {
            debug!(len = suggestion.chars().count(), "suggestion longer than requested");
        }
        Some(suggestion)
    }
}

#[async_trait]
impl Suggester for SuggestionClient {
    async fn suggest_time(
        &self,
        title: &str,
        priority: Priority,
        deadline: NaiveDate,
    ) -> Option<String> {
        if let Some(label) = self.extractor.extract(title) {
            debug!(%label, "time found in title; skipping model");
            return Some(label);
        }
        self.ask_model(title, priority, deadline).await
    }
}
