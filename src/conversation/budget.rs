// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::menus::{self, BTN_ADD_EXPENSE, BTN_BUDGET_SETTINGS, BTN_STATS, Keyboard};
use super::{BudgetStep, Ctx, MSG_FAILURE, Reply, State, Turn};
use crate::ledger::{self, BudgetStatus};
use crate::models::{BudgetPeriod, TxKind};
use crate::utils::{
    capitalize, checked_sum, escape_html, fmt_money, month_start, parse_positive_amount,
};
use anyhow::Result;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use tracing::{error, warn};

const WARN_AT_PCT: i64 = 80;

pub fn start() -> Turn {
    menu_turn("💰 <b>Розділ бюджету</b>\nОберіть дію:")
}

fn menu_turn(text: &str) -> Turn {
    Turn::to(
        State::Budget(BudgetStep::Menu),
        Reply::html(text).with_keyboard(Keyboard::Budget),
    )
}

pub fn handle(ctx: &mut Ctx<'_>, step: BudgetStep, text: &str) -> Result<Turn> {
    match step {
        BudgetStep::Menu => menu(ctx, text),
        BudgetStep::AddingExpense => add_expense(ctx, text),
        BudgetStep::SettingLimit => set_limit(ctx, text),
    }
}

fn menu(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    if menus::is_button(text, BTN_ADD_EXPENSE) {
        return Ok(Turn::to(
            State::Budget(BudgetStep::AddingExpense),
            Reply::html(
                "Введіть витрату у форматі:\n<code>100 їжа</code> або <code>200 транспорт</code>\n\
                 Або напишіть «скасувати» для повернення",
            )
            .with_keyboard(Keyboard::Cancel),
        ));
    }
    if menus::is_button(text, BTN_STATS) {
        return statistics(ctx);
    }
    if menus::is_button(text, BTN_BUDGET_SETTINGS) {
        return Ok(Turn::to(
            State::Budget(BudgetStep::SettingLimit),
            Reply::html(
                "⚙ <b>Налаштування бюджету</b>\n\n\
                 Введіть ліміт у форматі:\n<code>категорія ліміт [тиждень]</code>\n\
                 Наприклад: <code>їжа 3000</code> або <code>кава 500 тиждень</code>\n\
                 Без періоду ліміт діє на місяць.\n\n\
                 Доступні команди:\n/list — показати поточні ліміти\n/cancel — скасувати",
            )
            .with_keyboard(Keyboard::BudgetLimits),
        ));
    }
    Ok(start())
}

/// "100 їжа" / "99,5 кава з собою": amount first, the rest is the category.
pub fn parse_expense(text: &str) -> Option<(Decimal, String)> {
    let (amount, category) = text.trim().split_once(char::is_whitespace)?;
    let amount = parse_positive_amount(amount)?;
    let category = category.split_whitespace().collect::<Vec<_>>().join(" ");
    if category.is_empty() {
        return None;
    }
    Some((amount, category.to_lowercase()))
}

/// "їжа 3000" / "дитячий садок 2500" / "кава 500 тиждень": the limit is the
/// last token, optionally followed by a period word (monthly by default).
pub fn parse_limit(text: &str) -> Option<(String, Decimal, BudgetPeriod)> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    let period = match tokens.last().and_then(|w| BudgetPeriod::from_word(w)) {
        Some(p) => {
            tokens.pop();
            p
        }
        None => BudgetPeriod::Monthly,
    };
    let (limit, category) = tokens.split_last()?;
    let limit = parse_positive_amount(limit)?;
    if category.is_empty() {
        return None;
    }
    Some((category.join(" ").to_lowercase(), limit, period))
}

fn add_expense(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    let Some((amount, category)) = parse_expense(text) else {
        return Ok(Turn::to(
            State::Budget(BudgetStep::AddingExpense),
            Reply::html("❌ Невірний формат. Введіть, наприклад: <code>100 їжа</code>")
                .with_keyboard(Keyboard::Cancel),
        ));
    };
    if let Err(e) =
        ledger::add_transaction(ctx.conn, ctx.user.id, amount, TxKind::Expense, &category, None)
    {
        error!(user_id = ctx.user.id, error = ?e, "cannot record expense");
        return Ok(Turn::to(
            State::Budget(BudgetStep::AddingExpense),
            Reply::plain(MSG_FAILURE).with_keyboard(Keyboard::Cancel),
        ));
    }
    let mut text = format!(
        "✅ Витрату {} на «{}» додано!",
        fmt_money(&amount, &ctx.user.currency),
        escape_html(&category)
    );
    match limit_alert(ctx, &category) {
        Ok(Some(alert)) => {
            text.push_str("\n\n");
            text.push_str(&alert);
        }
        Ok(None) => {}
        Err(e) => warn!(user_id = ctx.user.id, error = ?e, "cannot check budget limit"),
    }
    Ok(menu_turn(&text))
}

fn set_limit(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    let stay = |reply: Reply| {
        Turn::to(
            State::Budget(BudgetStep::SettingLimit),
            reply.with_keyboard(Keyboard::BudgetLimits),
        )
    };
    let Some((category, limit, period)) = parse_limit(text) else {
        return Ok(stay(Reply::html(
            "❌ Невірний формат. Введіть, наприклад: <code>їжа 3000</code>. \
             Ліміт має бути від 0,01 до 1 000 000 000 000.",
        )));
    };
    match ledger::upsert_budget(ctx.conn, ctx.user.id, &category, limit, period) {
        Ok(b) => Ok(stay(Reply::plain(format!(
            "✅ Ліміт для «{}» встановлено на {} {}. Можна ввести ще один або /cancel.",
            b.category,
            fmt_money(&b.limit, &ctx.user.currency),
            b.period.label()
        )))),
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "cannot set budget limit");
            Ok(stay(Reply::plain(MSG_FAILURE)))
        }
    }
}

/// `/list`: current limits; the caller's state is kept.
pub fn list_limits(ctx: &mut Ctx<'_>, state: State) -> Result<Turn> {
    let budgets = match ledger::list_budgets(ctx.conn, ctx.user.id) {
        Ok(b) => b,
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "cannot list budget limits");
            return Ok(Turn::failed(state));
        }
    };
    let keyboard = state.keyboard();
    if budgets.is_empty() {
        return Ok(Turn::to(
            state,
            Reply::plain("У вас ще немає встановлених лімітів.").with_keyboard(keyboard),
        ));
    }
    let mut text = String::from("📋 <b>Ваші поточні ліміти:</b>\n");
    for b in &budgets {
        text.push_str(&format!(
            "▪ {}: {} {}\n",
            escape_html(&b.category),
            b.limit.normalize(),
            b.period.label()
        ));
    }
    text.push_str(&format!(
        "\nВалюта: {}",
        crate::utils::currency_symbol(&ctx.user.currency)
    ));
    Ok(Turn::to(state, Reply::html(text).with_keyboard(keyboard)))
}

fn statistics(ctx: &mut Ctx<'_>) -> Result<Turn> {
    match monthly_statistics(ctx) {
        Ok(text) => Ok(menu_turn(&text)),
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "cannot build statistics");
            Ok(menu_turn("❌ Сталася помилка при отриманні статистики."))
        }
    }
}

fn monthly_statistics(ctx: &mut Ctx<'_>) -> Result<String> {
    let since = month_start(ctx.today).and_time(NaiveTime::default());
    let txs = ledger::transactions_since(ctx.conn, ctx.user.id, Some(since))?;
    let expenses: Vec<_> = txs.iter().filter(|t| t.kind == TxKind::Expense).collect();
    if expenses.is_empty() {
        return Ok("📭 У вас ще немає витрат за цей місяць.".to_string());
    }
    let ccy = &ctx.user.currency;
    let total = checked_sum(expenses.iter().map(|t| t.amount))?;
    let mut text = String::from("📊 <b>Ваша статистика за місяць:</b>\n\n");
    text.push_str(&format!("💵 Загальні витрати: {}\n\n", fmt_money(&total, ccy)));
    text.push_str("<b>За категоріями:</b>\n");
    for s in crate::analytics::category_breakdown(&expenses)? {
        text.push_str(&format!(
            "▪ {}: {} ({:.1}%)\n",
            escape_html(&capitalize(&s.category)),
            fmt_money(&s.total, ccy),
            s.percent
        ));
    }

    let statuses = ledger::budget_status(ctx.conn, ctx.user.id, ctx.today)?;
    if !statuses.is_empty() {
        text.push_str("\n<b>Ліміти:</b>\n");
        for st in &statuses {
            text.push_str(&status_line(st, ccy));
        }
    }
    Ok(text)
}

fn status_line(st: &BudgetStatus, ccy: &str) -> String {
    let mark = if st.is_exceeded() {
        "🔴"
    } else if st.used_pct() >= Decimal::from(WARN_AT_PCT) {
        "🟡"
    } else {
        "🟢"
    };
    format!(
        "{} {}: {} з {} {} ({:.0}%)\n",
        mark,
        escape_html(&capitalize(&st.budget.category)),
        fmt_money(&st.spent, ccy),
        fmt_money(&st.budget.limit, ccy),
        st.budget.period.label(),
        st.used_pct()
    )
}

/// Warning text when spending in `category` has reached 80% of its limit or
/// gone over it. `None` when the user switched alerts off or no limit exists.
pub fn limit_alert(ctx: &mut Ctx<'_>, category: &str) -> Result<Option<String>> {
    if !ctx.user.budget_alerts {
        return Ok(None);
    }
    let category = category.trim().to_lowercase();
    let statuses = ledger::budget_status(ctx.conn, ctx.user.id, ctx.today)?;
    let Some(st) = statuses.into_iter().find(|s| s.budget.category == category) else {
        return Ok(None);
    };
    let ccy = &ctx.user.currency;
    let alert = if st.is_exceeded() {
        Some(format!(
            "⚠️ Ліміт для «{}» перевищено: {} з {}",
            escape_html(&category),
            fmt_money(&st.spent, ccy),
            fmt_money(&st.budget.limit, ccy)
        ))
    } else if st.used_pct() >= Decimal::from(WARN_AT_PCT) {
        Some(format!(
            "⚠️ Використано {:.0}% ліміту для «{}»",
            st.used_pct(),
            escape_html(&category)
        ))
    } else {
        None
    };
    Ok(alert)
}
