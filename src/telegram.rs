// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Minimal blocking client for the Telegram Bot API: long polling plus the
//! handful of send methods the bot needs.

use crate::conversation::menus::Keyboard;
use crate::conversation::{Document, Incoming, Reply};
use crate::models::Profile;
use crate::utils::{MAX_MESSAGE_CHARS, http_client, split_message};
use reqwest::blocking::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.telegram.org";
/// Slack on top of the long-poll timeout before the HTTP client gives up.
const HTTP_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("telegram api returned ok without a result")]
    MissingResult,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<Sender>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The `from` object of a message.
#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

impl Message {
    /// The conversation input for a text message from a user.
    pub fn incoming(&self) -> Option<Incoming> {
        let from = self.from.as_ref()?;
        let text = self.text.clone()?;
        Some(Incoming {
            user_id: from.id,
            profile: Profile {
                username: from.username.clone(),
                first_name: from.first_name.clone(),
                last_name: from.last_name.clone(),
                language_code: from.language_code.clone(),
            },
            text,
        })
    }
}

#[derive(Debug, Serialize)]
struct ReplyMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct KeyboardButton {
    text: String,
}

fn markup(keyboard: &Keyboard) -> ReplyMarkup {
    ReplyMarkup {
        keyboard: keyboard
            .rows()
            .into_iter()
            .map(|row| row.into_iter().map(|text| KeyboardButton { text }).collect())
            .collect(),
        resize_keyboard: true,
    }
}

#[derive(Debug, Serialize)]
struct SendMessage {
    chat_id: i64,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

fn message_bodies(chat_id: i64, reply: &Reply) -> Vec<SendMessage> {
    let parts = split_message(&reply.text, MAX_MESSAGE_CHARS);
    let last = parts.len() - 1;
    parts
        .into_iter()
        .enumerate()
        .map(|(i, text)| SendMessage {
            chat_id,
            text,
            parse_mode: reply.html.then_some("HTML"),
            reply_markup: if i == last {
                reply.keyboard.as_ref().map(markup)
            } else {
                None
            },
        })
        .collect()
}

pub struct TelegramApi {
    http: reqwest::blocking::Client,
    base: String,
}

impl TelegramApi {
    pub fn new(token: &str, poll_timeout: Duration) -> anyhow::Result<Self> {
        Self::with_base(API_BASE, token, poll_timeout)
    }

    /// Same as [`new`](Self::new) against another server, e.g. a local stub.
    pub fn with_base(base: &str, token: &str, poll_timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(poll_timeout + HTTP_SLACK)?,
            base: format!("{}/bot{}", base.trim_end_matches('/'), token),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    fn unwrap_response<T: DeserializeOwned>(
        resp: reqwest::blocking::Response,
    ) -> Result<T, TelegramError> {
        let body: ApiResponse<T> = resp.json()?;
        if !body.ok {
            return Err(TelegramError::Api {
                code: body.error_code.unwrap_or_default(),
                description: body.description.unwrap_or_default(),
            });
        }
        body.result.ok_or(TelegramError::MissingResult)
    }

    pub fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, TelegramError> {
        let resp = self
            .http
            .get(self.url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", timeout.as_secs().to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            .send()?;
        Self::unwrap_response(resp)
    }

    /// Sends `reply`, split into several messages when it exceeds Telegram's
    /// length limit. The keyboard rides on the last piece.
    pub fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        for body in message_bodies(chat_id, reply) {
            let resp = self.http.post(self.url("sendMessage")).json(&body).send()?;
            Self::unwrap_response::<serde_json::Value>(resp)?;
        }
        Ok(())
    }

    pub fn send_document(&self, chat_id: i64, doc: &Document) -> Result<(), TelegramError> {
        let part = Part::bytes(doc.bytes.clone()).file_name(doc.filename.clone());
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        let resp = self
            .http
            .post(self.url("sendDocument"))
            .multipart(form)
            .send()?;
        Self::unwrap_response::<serde_json::Value>(resp).map(|_| ())
    }

    /// Shows "typing..." while a slow answer is prepared.
    pub fn send_typing(&self, chat_id: i64) -> Result<(), TelegramError> {
        let resp = self
            .http
            .post(self.url("sendChatAction"))
            .json(&serde_json::json!({ "chat_id": chat_id, "action": "typing" }))
            .send()?;
        Self::unwrap_response::<bool>(resp).map(|_| ())
    }

    /// Sends the text reply and then, if any, its attached document.
    pub fn deliver(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        self.send_message(chat_id, reply)?;
        if let Some(doc) = &reply.document {
            self.send_document(chat_id, doc)?;
        }
        Ok(())
    }
}
