// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Long-polling loop that feeds Telegram updates into the conversation
//! controller and sends back its replies.

use crate::advice::OllamaClient;
use crate::config::{Config, SessionBackend};
use crate::conversation::menus::{self, Entry, Keyboard};
use crate::conversation::sessions::{MemorySessions, SessionStore, SqliteSessions};
use crate::conversation::{Controller, MSG_CRITICAL, Reply, State};
use crate::db;
use crate::telegram::{TelegramApi, Update};
use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(3);
const MSG_TEXT_ONLY: &str = "Надішліть, будь ласка, текстове повідомлення.";

pub fn handle(cfg: &Config, db_path: &Path) -> Result<()> {
    let token = cfg.require_token()?;
    let api = TelegramApi::new(token, cfg.poll_timeout)?;
    let conn = db::open_or_init(db_path)?;
    let advisor = Box::new(OllamaClient::new(cfg.advice.clone())?);

    info!(
        sessions = ?cfg.sessions,
        advice_host = %cfg.advice.host,
        model = %cfg.advice.model,
        "bot starting"
    );
    match cfg.sessions {
        SessionBackend::Sqlite => {
            let sessions = SqliteSessions::open(db_path)?;
            serve(&api, Controller::new(conn, sessions, advisor), cfg.poll_timeout)
        }
        SessionBackend::Memory => serve(
            &api,
            Controller::new(conn, MemorySessions::new(), advisor),
            cfg.poll_timeout,
        ),
    }
}

fn serve<S: SessionStore>(
    api: &TelegramApi,
    mut controller: Controller<S>,
    poll_timeout: Duration,
) -> Result<()> {
    let mut offset = 0;
    loop {
        let updates = match api.get_updates(offset, poll_timeout) {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "getUpdates failed; retrying");
                thread::sleep(RETRY_DELAY);
                continue;
            }
        };
        for update in updates {
            offset = offset.max(update.update_id + 1);
            process(api, &mut controller, &update);
        }
    }
}

fn process<S: SessionStore>(api: &TelegramApi, controller: &mut Controller<S>, update: &Update) {
    let Some(message) = &update.message else {
        debug!(update_id = update.update_id, "skipping non-message update");
        return;
    };
    let chat_id = message.chat.id;
    let Some(incoming) = message.incoming() else {
        if let Err(e) = api.send_message(chat_id, &Reply::plain(MSG_TEXT_ONLY)) {
            warn!(chat_id, error = %e, "cannot send reply");
        }
        return;
    };

    let asks_advice = controller.state_of(incoming.user_id) == State::Advice
        || matches!(menus::entry_point(&incoming.text), Some(Entry::Advice(Some(_))));
    if asks_advice && !menus::is_cancel(&incoming.text) {
        if let Err(e) = api.send_typing(chat_id) {
            debug!(chat_id, error = %e, "cannot send typing action");
        }
    }

    // One bad message must not take the polling loop down with it.
    let reply = match panic::catch_unwind(AssertUnwindSafe(|| controller.handle(&incoming))) {
        Ok(reply) => reply,
        Err(cause) => {
            let cause = cause
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            error!(user_id = incoming.user_id, %cause, "handler panicked");
            Reply::plain(MSG_CRITICAL).with_keyboard(Keyboard::Main)
        }
    };
    if let Err(e) = api.deliver(chat_id, &reply) {
        warn!(chat_id, user_id = incoming.user_id, error = %e, "cannot deliver reply");
    }
}
