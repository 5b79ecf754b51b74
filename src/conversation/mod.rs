// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-user conversation state machine.
//!
//! Every inbound message is resolved against the user's current [`State`]:
//! cancel keywords and global entry points first, then the handler of the
//! active section. Each handler returns a [`Turn`], the reply plus the next
//! state, and the controller stores that state in its [`SessionStore`].

pub mod advice;
pub mod analytics;
pub mod budget;
pub mod goals;
pub mod menus;
pub mod sessions;
pub mod settings;
pub mod transactions;

use crate::advice::Advisor;
use crate::ledger;
use crate::models::{Profile, TxKind, User};
use crate::utils::{capitalize, escape_html, fmt_money};
use anyhow::Result;
use chrono::NaiveDate;
use menus::{Entry, Keyboard};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sessions::SessionStore;
use tracing::{debug, error, warn};

pub const MSG_CRITICAL: &str =
    "🔴 Сталася критична помилка. Будь ласка, спробуйте ще раз пізніше.";
pub const MSG_FAILURE: &str = "❌ Сталася помилка. Спробуйте ще раз.";
pub const MSG_CANCELLED: &str = "Дію скасовано. Головне меню:";
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[default]
    Idle,
    Transaction(TxStep),
    Budget(BudgetStep),
    Goal(GoalStep),
    Analytics,
    Settings(SettingsStep),
    Advice,
}

/// Transaction form: type -> amount -> category -> description. Each step
/// carries what was collected before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStep {
    Kind,
    Amount {
        kind: TxKind,
    },
    Category {
        kind: TxKind,
        amount: Decimal,
    },
    Description {
        kind: TxKind,
        amount: Decimal,
        category: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStep {
    Menu,
    AddingExpense,
    SettingLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStep {
    Menu,
    Create,
    Deposit,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsStep {
    Menu,
    Currency,
}

impl State {
    /// Keyboard shown while the user sits in this state.
    pub fn keyboard(&self) -> Keyboard {
        match self {
            State::Idle => Keyboard::Main,
            State::Transaction(TxStep::Kind) => Keyboard::TxKind,
            State::Transaction(TxStep::Description { .. }) => Keyboard::Skip,
            State::Transaction(_) => Keyboard::Cancel,
            State::Budget(BudgetStep::Menu) => Keyboard::Budget,
            State::Budget(BudgetStep::SettingLimit) => Keyboard::BudgetLimits,
            State::Budget(BudgetStep::AddingExpense) => Keyboard::Cancel,
            State::Goal(GoalStep::Menu) => Keyboard::Goals,
            State::Goal(_) => Keyboard::Cancel,
            State::Analytics => Keyboard::Analytics,
            State::Settings(SettingsStep::Menu) => Keyboard::Settings,
            State::Settings(SettingsStep::Currency) => Keyboard::Currencies,
            State::Advice => Keyboard::Cancel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub html: bool,
    pub keyboard: Option<Keyboard>,
    pub document: Option<Document>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: false,
            keyboard: None,
            document: None,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            html: true,
            ..Self::plain(text)
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn with_document(mut self, doc: Document) -> Self {
        self.document = Some(doc);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub reply: Reply,
    pub next: State,
}

impl Turn {
    pub fn to(next: State, reply: Reply) -> Self {
        Self { reply, next }
    }

    pub fn idle(reply: Reply) -> Self {
        Self::to(State::Idle, reply.with_keyboard(Keyboard::Main))
    }

    /// Generic failure reply that leaves the user in `state`, draft included.
    pub fn failed(state: State) -> Self {
        let keyboard = state.keyboard();
        Self::to(state, Reply::plain(MSG_FAILURE).with_keyboard(keyboard))
    }
}

/// One inbound text message.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub user_id: i64,
    pub profile: Profile,
    pub text: String,
}

/// What a section handler gets to work with.
pub struct Ctx<'a> {
    pub conn: &'a mut Connection,
    pub user: &'a User,
    pub advisor: &'a dyn Advisor,
    pub today: NaiveDate,
}

pub struct Controller<S: SessionStore> {
    conn: Connection,
    sessions: S,
    advisor: Box<dyn Advisor>,
}

impl<S: SessionStore> Controller<S> {
    pub fn new(conn: Connection, sessions: S, advisor: Box<dyn Advisor>) -> Self {
        Self {
            conn,
            sessions,
            advisor,
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Current state of a user; unreadable sessions count as idle.
    pub fn state_of(&mut self, user_id: i64) -> State {
        self.sessions.load(user_id).unwrap_or_else(|e| {
            warn!(user_id, error = %e, "discarding unreadable session");
            State::Idle
        })
    }

    pub fn handle(&mut self, msg: &Incoming) -> Reply {
        self.handle_on(msg, crate::utils::now().date())
    }

    /// Same as [`handle`](Self::handle) with an explicit "today" for reports.
    pub fn handle_on(&mut self, msg: &Incoming, today: NaiveDate) -> Reply {
        let user = match ledger::get_or_create_user(&self.conn, msg.user_id, &msg.profile) {
            Ok(u) => u,
            Err(e) => {
                error!(user_id = msg.user_id, error = ?e, "cannot load user");
                return Reply::plain(MSG_FAILURE);
            }
        };
        let state = self.state_of(user.id);
        let text = msg.text.trim();
        debug!(user_id = user.id, state = ?state, "dispatching message");

        let mut ctx = Ctx {
            conn: &mut self.conn,
            user: &user,
            advisor: self.advisor.as_ref(),
            today,
        };
        let turn = match dispatch(&mut ctx, state.clone(), text) {
            Ok(turn) => turn,
            Err(e) => {
                error!(user_id = user.id, state = ?state, error = ?e, "handler failed");
                Turn::idle(Reply::plain(MSG_CRITICAL))
            }
        };
        if let Err(e) = self.sessions.save(user.id, &turn.next) {
            error!(user_id = user.id, error = ?e, "cannot store session");
        }
        turn.reply
    }
}

fn dispatch(ctx: &mut Ctx<'_>, state: State, text: &str) -> Result<Turn> {
    if menus::is_cancel(text) {
        return Ok(Turn::idle(Reply::plain(MSG_CANCELLED)));
    }
    if let Some(entry) = menus::entry_point(text) {
        return enter(ctx, entry, state);
    }
    if state != State::Idle && menus::is_back(text) {
        return Ok(Turn::idle(Reply::plain("Повертаємось до головного меню")));
    }
    match state {
        State::Idle => Ok(Turn::idle(Reply::plain(
            "🤔 Не зрозумів вас. Оберіть дію в меню або скористайтесь /help.",
        ))),
        State::Transaction(step) => transactions::handle(ctx, step, text),
        State::Budget(step) => budget::handle(ctx, step, text),
        State::Goal(step) => goals::handle(ctx, step, text),
        State::Analytics => analytics::handle(ctx, text),
        State::Settings(step) => settings::handle(ctx, step, text),
        State::Advice => advice::handle(ctx, text),
    }
}

fn enter(ctx: &mut Ctx<'_>, entry: Entry, state: State) -> Result<Turn> {
    match entry {
        Entry::Start => Ok(Turn::idle(Reply::html(welcome(ctx.user)))),
        Entry::Help => Ok(Turn::idle(Reply::html(HELP))),
        Entry::Transaction => Ok(transactions::start()),
        Entry::Budget => Ok(budget::start()),
        // Limits can be listed from anywhere without leaving the current step.
        Entry::ListBudgets => budget::list_limits(ctx, state),
        Entry::Goals => Ok(goals::start()),
        Entry::Analytics => Ok(analytics::start()),
        Entry::Advice(question) => Ok(advice::start(ctx, question.as_deref())),
        Entry::Settings => Ok(settings::start()),
        Entry::Balance => Ok(balance(ctx, state)),
        Entry::History => Ok(history(ctx, state)),
    }
}

fn welcome(user: &User) -> String {
    let name = if user.first_name.trim().is_empty() {
        "користувачу".to_string()
    } else {
        escape_html(&user.first_name)
    };
    format!(
        "🦉 <b>Привіт, {name}!</b>\n\n\
         Я — <b>FinWise Owl</b>, ваш особистий помічник у світі фінансів.\n\n\
         ➕ записуйте доходи та витрати\n\
         💰 встановлюйте ліміти бюджету\n\
         🎯 відкладайте на цілі\n\
         📊 переглядайте аналітику\n\
         🤖 питайте поради в AI"
    )
}

const HELP: &str = "ℹ️ <b>Довідка:</b>\n\n\
    /start — головне меню\n\
    /transaction — додати дохід або витрату\n\
    /budget — бюджет і ліміти\n\
    /list — поточні ліміти\n\
    /goals — фінансові цілі\n\
    /analytics — аналітика витрат\n\
    /advice — запитати AI\n\
    /balance — баланс\n\
    /history — останні транзакції\n\
    /settings — налаштування\n\
    /cancel — скасувати поточну дію";

/// Short balance summary, shared by the balance command and the form finish.
pub fn balance_text(conn: &Connection, user: &User) -> Result<String> {
    let bal = ledger::get_balance(conn, user.id)?;
    let ccy = &user.currency;
    let mut text = format!(
        "💼 <b>Баланс:</b> {}\n\n📥 Доходи: {}\n📤 Витрати: {}",
        fmt_money(&bal.total()?, ccy),
        fmt_money(&bal.income, ccy),
        fmt_money(&bal.expense, ccy)
    );
    if !bal.saved.is_zero() {
        text.push_str(&format!("\n🎯 Відкладено на цілі: {}", fmt_money(&bal.saved, ccy)));
    }
    Ok(text)
}

fn balance(ctx: &mut Ctx<'_>, state: State) -> Turn {
    match balance_text(ctx.conn, ctx.user) {
        Ok(text) => Turn::idle(Reply::html(text)),
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "cannot compute balance");
            Turn::failed(state)
        }
    }
}

fn history(ctx: &mut Ctx<'_>, state: State) -> Turn {
    let txs = match ledger::get_transactions(ctx.conn, ctx.user.id, HISTORY_LIMIT) {
        Ok(t) => t,
        Err(e) => {
            error!(user_id = ctx.user.id, error = ?e, "cannot load history");
            return Turn::failed(state);
        }
    };
    if txs.is_empty() {
        return Turn::idle(Reply::plain("📭 У вас ще немає транзакцій."));
    }
    let mut text = format!("📜 <b>Останні {} транзакцій:</b>\n\n", txs.len());
    for t in &txs {
        let sign = match t.kind {
            TxKind::Income => "➕",
            TxKind::Expense => "➖",
            TxKind::GoalDeposit => "🎯",
        };
        text.push_str(&format!(
            "{} {} {} — {}",
            t.date.format("%d.%m %H:%M"),
            sign,
            fmt_money(&t.amount, &ctx.user.currency),
            escape_html(&capitalize(&t.category))
        ));
        if let Some(d) = &t.description {
            text.push_str(&format!(" ({})", escape_html(d)));
        }
        text.push('\n');
    }
    Turn::idle(Reply::html(text))
}
