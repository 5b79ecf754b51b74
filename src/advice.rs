// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Client for the locally hosted chat-completion service (Ollama `/api/chat`).

use crate::config::AdviceConfig;
use crate::utils::{http_client, truncate_chars};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub const MIN_QUESTION_CHARS: usize = 3;
pub const MAX_ANSWER_CHARS: usize = 4000;
pub const TRUNCATION_MARKER: &str = "\n\n[...]";

pub const SYSTEM_PROMPT: &str = "Ти — фінансовий асистент FinWise Owl. \
    Надавай чіткі, лаконічні відповіді українською мовою. \
    Фокусуйся на фінансових порадах та аналізі.";

pub const MSG_UNAVAILABLE: &str = "Не вдалося отримати відповідь від AI. Спробуйте пізніше.";
pub const MSG_MALFORMED: &str = "Не вдалося обробити відповідь AI.";
pub const MSG_TIMEOUT: &str =
    "Час очікування відповіді минув. Будь ласка, сформулюйте коротше запитання.";
pub const MSG_GENERIC: &str = "Вибачте, сталася помилка при обробці вашого запиту.";

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("advice service timed out")]
    Timeout,
    #[error("cannot reach advice service: {0}")]
    Connect(String),
    #[error("advice service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed advice response: {0}")]
    Malformed(String),
    #[error("advice response has no content")]
    Empty,
}

impl AdviceError {
    /// Apology shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Timeout => MSG_TIMEOUT,
            Self::Connect(_) => MSG_GENERIC,
            Self::Status { .. } => MSG_UNAVAILABLE,
            Self::Malformed(_) | Self::Empty => MSG_MALFORMED,
        }
    }
}

impl From<reqwest::Error> for AdviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Connect(err.to_string())
        }
    }
}

/// Something that can answer a free-text question.
pub trait Advisor {
    fn ask(&self, question: &str) -> Result<String, AdviceError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

pub struct OllamaClient {
    http: reqwest::blocking::Client,
    cfg: AdviceConfig,
}

impl OllamaClient {
    pub fn new(cfg: AdviceConfig) -> anyhow::Result<Self> {
        let http = http_client(cfg.timeout)?;
        Ok(Self { http, cfg })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.host.trim_end_matches('/'), path)
    }

    /// Probes `/api/tags`; used by `doctor`.
    pub fn is_available(&self) -> bool {
        match self.http.get(self.url("/api/tags")).send() {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "advice service unavailable");
                false
            }
            Err(e) => {
                warn!(error = %e, "advice service health check failed");
                false
            }
        }
    }
}

impl Advisor for OllamaClient {
    fn ask(&self, question: &str) -> Result<String, AdviceError> {
        let request = ChatRequest {
            model: &self.cfg.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: question.into(),
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.cfg.temperature,
            },
        };

        let resp = self.http.post(self.url("/api/chat")).json(&request).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AdviceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.text()?;
        let reply: ChatResponse =
            serde_json::from_str(&body).map_err(|e| AdviceError::Malformed(e.to_string()))?;
        match reply.message {
            Some(m) if !m.content.trim().is_empty() => Ok(m.content),
            _ => Err(AdviceError::Empty),
        }
    }
}

/// At least [`MIN_QUESTION_CHARS`] non-whitespace characters.
pub fn is_valid_question(question: &str) -> bool {
    question.chars().filter(|c| !c.is_whitespace()).count() >= MIN_QUESTION_CHARS
}

/// Cuts overly long answers and appends a visible marker.
pub fn clip_answer(answer: &str) -> String {
    let (mut text, cut) = truncate_chars(answer, MAX_ANSWER_CHARS);
    if cut {
        text.push_str(TRUNCATION_MARKER);
    }
    text
}

/// Asks the advisor and always returns something printable: failures become
/// one of the fixed apology strings.
pub fn advise(advisor: &dyn Advisor, question: &str) -> String {
    match advisor.ask(question.trim()) {
        Ok(answer) => clip_answer(&answer),
        Err(e) => {
            error!(error = %e, "advice request failed");
            e.user_message().to_string()
        }
    }
}
