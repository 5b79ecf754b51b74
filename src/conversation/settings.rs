// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::menus::{self, BTN_CURRENCY, BTN_EXPORT, BTN_NOTIFICATIONS, Keyboard};
use super::{Ctx, Document, MSG_FAILURE, Reply, SettingsStep, State, Turn};
use crate::export::{self, ExportFormat};
use crate::ledger::{self, users::SUPPORTED_CURRENCIES};
use crate::utils::currency_symbol;
use anyhow::Result;
use tracing::{error, info};

pub fn start() -> Turn {
    menu_turn(Reply::html("⚙ <b>Налаштування</b>\nОберіть параметр:"))
}

fn menu_turn(reply: Reply) -> Turn {
    Turn::to(
        State::Settings(SettingsStep::Menu),
        reply.with_keyboard(Keyboard::Settings),
    )
}

pub fn handle(ctx: &mut Ctx<'_>, step: SettingsStep, text: &str) -> Result<Turn> {
    match step {
        SettingsStep::Menu => menu(ctx, text),
        SettingsStep::Currency => currency(ctx, text),
    }
}

fn menu(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    if menus::is_button(text, BTN_CURRENCY) {
        return Ok(Turn::to(
            State::Settings(SettingsStep::Currency),
            Reply::plain(format!(
                "Поточна валюта: {}. Оберіть нову:",
                ctx.user.currency
            ))
            .with_keyboard(Keyboard::Currencies),
        ));
    }
    if menus::is_button(text, BTN_NOTIFICATIONS) {
        let on = match ledger::toggle_budget_alerts(ctx.conn, ctx.user.id) {
            Ok(on) => on,
            Err(e) => {
                error!(user_id = ctx.user.id, error = ?e, "cannot toggle budget alerts");
                return Ok(Turn::failed(State::Settings(SettingsStep::Menu)));
            }
        };
        let msg = if on {
            "🔔 Сповіщення про ліміти бюджету увімкнено."
        } else {
            "🔕 Сповіщення про ліміти бюджету вимкнено."
        };
        return Ok(menu_turn(Reply::plain(msg)));
    }
    if menus::is_button(text, BTN_EXPORT) {
        return Ok(export_data(ctx));
    }
    Ok(start())
}

fn currency(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    let code = text.trim().to_uppercase();
    if !SUPPORTED_CURRENCIES.contains(&code.as_str()) {
        return Ok(Turn::to(
            State::Settings(SettingsStep::Currency),
            Reply::plain(format!(
                "❌ Невідома валюта. Доступні: {}",
                SUPPORTED_CURRENCIES.join(", ")
            ))
            .with_keyboard(Keyboard::Currencies),
        ));
    }
    if let Err(e) = ledger::set_currency(ctx.conn, ctx.user.id, &code) {
        error!(user_id = ctx.user.id, currency = %code, error = ?e, "cannot change currency");
        return Ok(Turn::failed(State::Settings(SettingsStep::Currency)));
    }
    info!(user_id = ctx.user.id, currency = %code, "currency changed");
    Ok(menu_turn(Reply::plain(format!(
        "✅ Валюту змінено на {} ({}).",
        code,
        currency_symbol(&code)
    ))))
}

fn export_data(ctx: &mut Ctx<'_>) -> Turn {
    match export::export_user(ctx.conn, ctx.user.id, ExportFormat::Csv) {
        Ok(bytes) => menu_turn(
            Reply::plain("📤 Ваші транзакції у форматі CSV.").with_document(Document {
                filename: format!("finwise_{}.{}", ctx.user.id, ExportFormat::Csv.extension()),
                bytes,
            }),
        ),
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "export failed");
            menu_turn(Reply::plain(MSG_FAILURE))
        }
    }
}
