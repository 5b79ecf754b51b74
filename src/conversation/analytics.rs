// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::menus::{self, BTN_CHART, BTN_DETAILED, BTN_MONTH, BTN_TOP, BTN_WEEK, Keyboard};
use super::{Ctx, Reply, State, Turn};
use crate::analytics;
use crate::ledger;
use anyhow::Result;
use tracing::error;

pub fn start() -> Turn {
    menu_turn(Reply::html("📊 <b>Розділ аналітики</b>\nОберіть тип звіту:"))
}

fn menu_turn(reply: Reply) -> Turn {
    Turn::to(State::Analytics, reply.with_keyboard(Keyboard::Analytics))
}

#[derive(Debug, Clone, Copy)]
enum Report {
    Month,
    Week,
    Top,
    Chart,
    Detailed,
}

fn report_for(text: &str) -> Option<Report> {
    [
        (BTN_MONTH, Report::Month),
        (BTN_WEEK, Report::Week),
        (BTN_TOP, Report::Top),
        (BTN_CHART, Report::Chart),
        (BTN_DETAILED, Report::Detailed),
    ]
    .into_iter()
    .find(|(label, _)| menus::is_button(text, label))
    .map(|(_, r)| r)
}

pub fn handle(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    let Some(report) = report_for(text) else {
        return Ok(start());
    };
    let txs = match ledger::transactions_since(ctx.conn, ctx.user.id, None) {
        Ok(t) => t,
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "cannot load transactions for report");
            return Ok(menu_turn(Reply::plain("❌ Помилка при формуванні звіту")));
        }
    };
    let ccy = &ctx.user.currency;
    let built = match report {
        Report::Month => analytics::monthly_report(&txs, ctx.today, ccy),
        Report::Week => analytics::weekly_report(&txs, ctx.today, ccy),
        Report::Top => analytics::top_categories(&txs, ccy),
        Report::Chart => analytics::expense_chart(&txs, ccy).map(|chart| {
            chart.unwrap_or_else(|| {
                "📭 Недостатньо даних для побудови графіка. Потрібно щонайменше 2 місяці даних."
                    .to_string()
            })
        }),
        Report::Detailed => analytics::detailed_analysis(&txs, ccy),
    };
    match built {
        Ok(text) => Ok(menu_turn(Reply::html(text))),
        Err(e) => {
            error!(user_id = ctx.user.id, report = ?report, error = ?e, "cannot build report");
            Ok(menu_turn(Reply::plain("❌ Помилка при формуванні звіту")))
        }
    }
}
