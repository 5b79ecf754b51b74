// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::menus::{self, BTN_EXPENSE, BTN_INCOME, Keyboard};
use super::{Ctx, MSG_FAILURE, Reply, State, Turn, TxStep, balance_text, budget};
use crate::ledger;
use crate::models::TxKind;
use crate::utils::{MAX_AMOUNT, escape_html, fmt_money, parse_amount};
use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{error, warn};

pub const MAX_CATEGORY_CHARS: usize = 64;
pub const MAX_DESCRIPTION_CHARS: usize = 256;
const SUGGESTED_CATEGORIES: usize = 6;

pub fn start() -> Turn {
    Turn::to(
        State::Transaction(TxStep::Kind),
        Reply::html("➕ <b>Нова транзакція</b>\nОберіть тип:").with_keyboard(Keyboard::TxKind),
    )
}

pub fn handle(ctx: &mut Ctx<'_>, step: TxStep, text: &str) -> Result<Turn> {
    match step {
        TxStep::Kind => Ok(choose_kind(text)),
        TxStep::Amount { kind } => amount(ctx, kind, text),
        TxStep::Category { kind, amount } => Ok(category(kind, amount, text)),
        TxStep::Description {
            kind,
            amount,
            category,
        } => describe(ctx, kind, amount, category, text),
    }
}

fn choose_kind(text: &str) -> Turn {
    let kind = if menus::is_button(text, BTN_INCOME) {
        TxKind::Income
    } else if menus::is_button(text, BTN_EXPENSE) {
        TxKind::Expense
    } else {
        return Turn::to(
            State::Transaction(TxStep::Kind),
            Reply::plain("Оберіть тип транзакції кнопкою: Дохід або Витрата.")
                .with_keyboard(Keyboard::TxKind),
        );
    };
    Turn::to(
        State::Transaction(TxStep::Amount { kind }),
        Reply::plain(format!(
            "{}: введіть суму (наприклад, 150 або 99,50):",
            kind.label()
        ))
        .with_keyboard(Keyboard::Cancel),
    )
}

fn amount(ctx: &mut Ctx<'_>, kind: TxKind, text: &str) -> Result<Turn> {
    let stay = |msg: &str| {
        Turn::to(
            State::Transaction(TxStep::Amount { kind }),
            Reply::plain(msg).with_keyboard(Keyboard::Cancel),
        )
    };
    let Some(amount) = parse_amount(text) else {
        return Ok(stay(
            "❌ Невірний формат суми. Введіть число, наприклад 150 або 99,50.",
        ));
    };
    if amount.round_dp(2) <= Decimal::ZERO {
        return Ok(stay("❌ Сума має бути більшою за нуль."));
    }
    if amount > MAX_AMOUNT {
        let msg = format!(
            "❌ Сума не може перевищувати {}.",
            fmt_money(&MAX_AMOUNT, &ctx.user.currency)
        );
        return Ok(stay(&msg));
    }
    let recent = match ledger::recent_categories(ctx.conn, ctx.user.id, kind, SUGGESTED_CATEGORIES)
    {
        Ok(r) => r,
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "cannot load recent categories");
            return Ok(Turn::failed(State::Transaction(TxStep::Amount { kind })));
        }
    };
    let keyboard = if recent.is_empty() {
        Keyboard::Cancel
    } else {
        Keyboard::Choices(recent)
    };
    Ok(Turn::to(
        State::Transaction(TxStep::Category { kind, amount }),
        Reply::plain("Введіть категорію (наприклад: їжа, транспорт, зарплата):")
            .with_keyboard(keyboard),
    ))
}

fn category(kind: TxKind, amount: Decimal, text: &str) -> Turn {
    let category = text.trim().to_lowercase();
    if category.is_empty() || category.chars().count() > MAX_CATEGORY_CHARS {
        return Turn::to(
            State::Transaction(TxStep::Category { kind, amount }),
            Reply::plain(format!(
                "❌ Категорія має містити від 1 до {} символів.",
                MAX_CATEGORY_CHARS
            ))
            .with_keyboard(Keyboard::Cancel),
        );
    }
    Turn::to(
        State::Transaction(TxStep::Description {
            kind,
            amount,
            category,
        }),
        Reply::plain("Додайте опис або натисніть «Пропустити»:").with_keyboard(Keyboard::Skip),
    )
}

fn describe(
    ctx: &mut Ctx<'_>,
    kind: TxKind,
    amount: Decimal,
    category: String,
    text: &str,
) -> Result<Turn> {
    let description = if menus::is_skip(text) {
        None
    } else if text.chars().count() > MAX_DESCRIPTION_CHARS {
        return Ok(Turn::to(
            State::Transaction(TxStep::Description {
                kind,
                amount,
                category,
            }),
            Reply::plain(format!(
                "❌ Опис задовгий (максимум {} символів).",
                MAX_DESCRIPTION_CHARS
            ))
            .with_keyboard(Keyboard::Skip),
        ));
    } else {
        Some(text.trim().to_string())
    };

    if let Err(e) = ledger::add_transaction(
        ctx.conn,
        ctx.user.id,
        amount,
        kind,
        &category,
        description.as_deref(),
    ) {
        error!(user_id = ctx.user.id, error = ?e, "cannot record transaction");
        return Ok(Turn::to(
            State::Transaction(TxStep::Description {
                kind,
                amount,
                category,
            }),
            Reply::plain(MSG_FAILURE).with_keyboard(Keyboard::Skip),
        ));
    }

    // The transaction is stored; summary lines below are best effort.
    let mut text = format!(
        "✅ {} {} ({}) додано!",
        kind.label(),
        fmt_money(&amount, &ctx.user.currency),
        escape_html(&category),
    );
    match balance_text(ctx.conn, ctx.user) {
        Ok(balance) => {
            text.push_str("\n\n");
            text.push_str(&balance);
        }
        Err(e) => warn!(user_id = ctx.user.id, error = ?e, "cannot summarize balance"),
    }
    if kind == TxKind::Expense {
        match budget::limit_alert(ctx, &category) {
            Ok(Some(alert)) => {
                text.push_str("\n\n");
                text.push_str(&alert);
            }
            Ok(None) => {}
            Err(e) => warn!(user_id = ctx.user.id, error = ?e, "cannot check budget limit"),
        }
    }
    Ok(Turn::idle(Reply::html(text)))
}
