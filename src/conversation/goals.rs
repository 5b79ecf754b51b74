// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::menus::{
    self, BTN_GOAL_DELETE, BTN_GOAL_DEPOSIT, BTN_GOAL_LIST, BTN_GOAL_NEW, Keyboard,
};
use super::{Ctx, GoalStep, MSG_FAILURE, Reply, State, Turn};
use crate::ledger::{self, DepositOutcome};
use crate::models::Goal;
use crate::utils::{escape_html, fmt_money, parse_positive_amount};
use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::error;

pub const MAX_GOAL_MONTHS: u32 = 600;
pub const DESCRIPTION_DELIMITER: char = '|';
const PROGRESS_CELLS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct GoalDraft {
    pub name: String,
    pub target: Decimal,
    pub months: u32,
    pub description: Option<String>,
}

pub fn start() -> Turn {
    menu_turn(Reply::html(
        "🎯 <b>Розділ цілей</b>\nТут ви можете керувати своїми фінансовими цілями",
    ))
}

fn menu_turn(reply: Reply) -> Turn {
    Turn::to(
        State::Goal(GoalStep::Menu),
        reply.with_keyboard(Keyboard::Goals),
    )
}

fn stay(step: GoalStep, reply: Reply) -> Turn {
    Turn::to(State::Goal(step), reply.with_keyboard(Keyboard::Cancel))
}

/// The user's goals, or the failure turn that keeps them in `step`.
fn load_goals(ctx: &mut Ctx<'_>, step: GoalStep) -> Result<Vec<Goal>, Turn> {
    ledger::list_goals(ctx.conn, ctx.user.id).map_err(|e| {
        error!(user_id = ctx.user.id, error = ?e, "cannot load goals");
        Turn::failed(State::Goal(step))
    })
}

pub fn handle(ctx: &mut Ctx<'_>, step: GoalStep, text: &str) -> Result<Turn> {
    match step {
        GoalStep::Menu => menu(ctx, text),
        GoalStep::Create => create(ctx, text),
        GoalStep::Deposit => deposit(ctx, text),
        GoalStep::Delete => delete(ctx, text),
    }
}

fn menu(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    if menus::is_button(text, BTN_GOAL_NEW) {
        return Ok(stay(
            GoalStep::Create,
            Reply::html(
                "Введіть ціль у форматі:\n<code>Назва Сума Місяці</code>\n\
                 Наприклад: <code>Ноутбук 25000 6</code>\n\n\
                 Опис можна додати після риски: <code>Ноутбук 25000 6 | для навчання</code>",
            ),
        ));
    }
    if menus::is_button(text, BTN_GOAL_LIST) {
        let goals = match load_goals(ctx, GoalStep::Menu) {
            Ok(g) => g,
            Err(turn) => return Ok(turn),
        };
        return Ok(menu_turn(Reply::html(render_list(&goals, &ctx.user.currency))));
    }
    if menus::is_button(text, BTN_GOAL_DEPOSIT) || menus::is_button(text, BTN_GOAL_DELETE) {
        let goals = match load_goals(ctx, GoalStep::Menu) {
            Ok(g) => g,
            Err(turn) => return Ok(turn),
        };
        if goals.is_empty() {
            return Ok(menu_turn(Reply::plain(
                "У вас ще немає цілей. Створіть першу кнопкою «Нова ціль».",
            )));
        }
        let list = render_list(&goals, &ctx.user.currency);
        return Ok(if menus::is_button(text, BTN_GOAL_DEPOSIT) {
            stay(
                GoalStep::Deposit,
                Reply::html(format!(
                    "{list}\n\nВведіть номер цілі та суму: <code>1 1000</code>"
                )),
            )
        } else {
            stay(
                GoalStep::Delete,
                Reply::html(format!("{list}\n\nВведіть номер цілі для видалення:")),
            )
        });
    }
    Ok(start())
}

/// Parses "Назва Сума Місяці" from the right: months, then amount, and the
/// leading words form the name. A description is only taken after `|`.
pub fn parse_goal(text: &str) -> Option<GoalDraft> {
    let (main, description) = match text.split_once(DESCRIPTION_DELIMITER) {
        Some((main, desc)) => (main, Some(desc.trim()).filter(|d| !d.is_empty())),
        None => (text, None),
    };
    let tokens: Vec<&str> = main.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }
    let months: u32 = tokens[tokens.len() - 1].parse().ok()?;
    if months == 0 || months > MAX_GOAL_MONTHS {
        return None;
    }
    let target = parse_positive_amount(tokens[tokens.len() - 2])?;
    let name = tokens[..tokens.len() - 2].join(" ");
    Some(GoalDraft {
        name,
        target,
        months,
        description: description.map(|d| d.to_string()),
    })
}

fn create(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    let Some(draft) = parse_goal(text) else {
        return Ok(stay(
            GoalStep::Create,
            Reply::html(
                "❌ Невірний формат. Введіть, наприклад: <code>Ноутбук 25000 6</code>\n\
                 (місяці — ціле число від 1 до 600)",
            ),
        ));
    };
    match ledger::create_goal(
        ctx.conn,
        ctx.user.id,
        &draft.name,
        draft.target,
        draft.months,
        draft.description.as_deref(),
    ) {
        Ok(goal) => Ok(menu_turn(Reply::html(format!(
            "✅ Ціль «{}» створено!\n\n🎯 Сума: {}\n📆 Термін: {} міс.\n💰 Відкладайте по {} на місяць",
            escape_html(&goal.name),
            fmt_money(&goal.target_amount, &ctx.user.currency),
            goal.months,
            fmt_money(&goal.monthly_installment(), &ctx.user.currency)
        )))),
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "cannot create goal");
            Ok(stay(GoalStep::Create, Reply::plain(MSG_FAILURE)))
        }
    }
}

/// Resolves the 1-based position shown in the list to a goal.
fn goal_at(goals: &[Goal], token: &str) -> Option<i64> {
    let n: usize = token.trim().trim_end_matches('.').parse().ok()?;
    goals.get(n.checked_sub(1)?).map(|g| g.id)
}

fn deposit(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    let retry = "❌ Введіть номер цілі та суму, наприклад: <code>1 1000</code>";
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 2 {
        return Ok(stay(GoalStep::Deposit, Reply::html(retry)));
    }
    let goals = match load_goals(ctx, GoalStep::Deposit) {
        Ok(g) => g,
        Err(turn) => return Ok(turn),
    };
    let (Some(goal_id), Some(amount)) = (goal_at(&goals, tokens[0]), parse_positive_amount(tokens[1]))
    else {
        return Ok(stay(GoalStep::Deposit, Reply::html(retry)));
    };

    let ccy = ctx.user.currency.clone();
    let outcome = match ledger::deposit(ctx.conn, ctx.user.id, goal_id, amount) {
        Ok(o) => o,
        Err(e) => {
            error!(user_id = ctx.user.id, goal_id, error = ?e, "goal deposit failed");
            return Ok(stay(GoalStep::Deposit, Reply::plain(MSG_FAILURE)));
        }
    };
    let reply = match outcome {
        DepositOutcome::Credited {
            goal,
            credited,
            overflow,
        } => {
            let mut text = format!(
                "✅ Ціль «{}» поповнено на {}\n{}",
                escape_html(&goal.name),
                fmt_money(&credited, &ccy),
                progress_line(&goal, &ccy)
            );
            if !overflow.is_zero() {
                text.push_str(&format!(
                    "\n\n⚠️ Сума перевищує залишок до цілі. {} не зараховано.",
                    fmt_money(&overflow, &ccy)
                ));
            }
            if goal.is_reached() {
                text.push_str("\n\n🎉 Вітаємо! Ціль досягнуто!");
            }
            Reply::html(text)
        }
        DepositOutcome::AlreadyReached(goal) => Reply::html(format!(
            "🎉 Ціль «{}» вже досягнуто, поповнення не потрібне.",
            escape_html(&goal.name)
        )),
        DepositOutcome::NotFound => Reply::plain("❌ Ціль не знайдено."),
    };
    Ok(menu_turn(reply))
}

fn delete(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    let goals = match load_goals(ctx, GoalStep::Delete) {
        Ok(g) => g,
        Err(turn) => return Ok(turn),
    };
    let Some(goal_id) = goal_at(&goals, text) else {
        return Ok(stay(
            GoalStep::Delete,
            Reply::plain("❌ Введіть номер цілі зі списку."),
        ));
    };
    match ledger::delete_goal(ctx.conn, ctx.user.id, goal_id) {
        Ok(Some(name)) => Ok(menu_turn(Reply::html(format!(
            "🗑 Ціль «{}» видалено.",
            escape_html(&name)
        )))),
        Ok(None) => Ok(menu_turn(Reply::plain("❌ Ціль не знайдено."))),
        Err(e) => {
            error!(user_id = ctx.user.id, goal_id, error = ?e, "cannot delete goal");
            Ok(stay(GoalStep::Delete, Reply::plain(MSG_FAILURE)))
        }
    }
}

fn progress_bar(goal: &Goal) -> String {
    let filled = (goal.progress_pct() / Decimal::from(100 / PROGRESS_CELLS as u32))
        .floor()
        .to_usize()
        .unwrap_or(0)
        .min(PROGRESS_CELLS);
    format!("{}{}", "▰".repeat(filled), "▱".repeat(PROGRESS_CELLS - filled))
}

fn progress_line(goal: &Goal, ccy: &str) -> String {
    format!(
        "{} {:.0}% ({} з {})",
        progress_bar(goal),
        goal.progress_pct(),
        fmt_money(&goal.current_amount, ccy),
        fmt_money(&goal.target_amount, ccy)
    )
}

pub fn render_list(goals: &[Goal], ccy: &str) -> String {
    if goals.is_empty() {
        return "📭 У вас ще немає цілей.".to_string();
    }
    let mut text = String::from("📋 <b>Ваші цілі:</b>\n");
    for (i, g) in goals.iter().enumerate() {
        text.push_str(&format!("\n{}. <b>{}</b>\n", i + 1, escape_html(&g.name)));
        text.push_str(&progress_line(g, ccy));
        text.push('\n');
        if let Some(d) = &g.description {
            text.push_str(&format!("📝 {}\n", escape_html(d)));
        }
        if !g.is_reached() {
            text.push_str(&format!(
                "💰 Залишилось: {} • по {} / міс.\n",
                fmt_money(&g.remaining(), ccy),
                fmt_money(&g.monthly_installment(), ccy)
            ));
        }
    }
    text
}
