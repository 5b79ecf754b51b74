// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Button labels, keyboard layouts and keyword matching. Handlers only name a
//! [`Keyboard`]; the transport decides how to draw it.

use crate::utils::normalize_label;

// Main menu
pub const BTN_BUDGET: &str = "💰 Бюджет";
pub const BTN_ADVICE: &str = "🤖 AI Поради";
pub const BTN_GOALS: &str = "🎯 Цілі";
pub const BTN_ANALYTICS: &str = "📊 Аналіз";
pub const BTN_TRANSACTION: &str = "➕ Транзакція";
pub const BTN_SETTINGS: &str = "⚙ Налаштування";
pub const BTN_BALANCE: &str = "💼 Баланс";
pub const BTN_HISTORY: &str = "📜 Історія";

// Shared
pub const BTN_CANCEL: &str = "❌ Скасувати";
pub const BTN_BACK: &str = "🔙 На головну";
pub const BTN_SKIP: &str = "⏭ Пропустити";

// Transaction form
pub const BTN_INCOME: &str = "💵 Дохід";
pub const BTN_EXPENSE: &str = "💸 Витрата";

// Budget section
pub const BTN_ADD_EXPENSE: &str = "➕ Додати витрату";
pub const BTN_STATS: &str = "📊 Статистика";
pub const BTN_BUDGET_SETTINGS: &str = "⚙ Налаштування бюджету";

// Goals section
pub const BTN_GOAL_NEW: &str = "➕ Нова ціль";
pub const BTN_GOAL_DEPOSIT: &str = "💰 Поповнити";
pub const BTN_GOAL_DELETE: &str = "🗑 Видалити ціль";
pub const BTN_GOAL_LIST: &str = "📋 Мої цілі";

// Analytics section
pub const BTN_MONTH: &str = "📅 За місяць";
pub const BTN_WEEK: &str = "📆 За тиждень";
pub const BTN_TOP: &str = "📊 Топ категорій";
pub const BTN_CHART: &str = "📈 Графік витрат";
pub const BTN_DETAILED: &str = "🔍 Детальний аналіз";

// Settings section
pub const BTN_CURRENCY: &str = "💱 Змінити валюту";
pub const BTN_NOTIFICATIONS: &str = "🔔 Сповіщення";
pub const BTN_EXPORT: &str = "📤 Експорт даних";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    Main,
    TxKind,
    Budget,
    BudgetLimits,
    Goals,
    Analytics,
    Settings,
    Currencies,
    Cancel,
    Skip,
    /// Dynamic suggestions (e.g. recent categories) followed by a cancel row.
    Choices(Vec<String>),
}

fn row(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

impl Keyboard {
    pub fn rows(&self) -> Vec<Vec<String>> {
        match self {
            Self::Main => vec![
                row(&[BTN_BUDGET, BTN_ADVICE]),
                row(&[BTN_GOALS, BTN_ANALYTICS]),
                row(&[BTN_TRANSACTION, BTN_SETTINGS]),
                row(&[BTN_BALANCE, BTN_HISTORY]),
            ],
            Self::TxKind => vec![row(&[BTN_INCOME, BTN_EXPENSE]), row(&[BTN_CANCEL])],
            Self::Budget => vec![
                row(&[BTN_ADD_EXPENSE, BTN_STATS]),
                row(&[BTN_BUDGET_SETTINGS, BTN_CANCEL]),
            ],
            Self::BudgetLimits => vec![row(&["/list", BTN_CANCEL])],
            Self::Goals => vec![
                row(&[BTN_GOAL_NEW, BTN_GOAL_DEPOSIT]),
                row(&[BTN_GOAL_DELETE, BTN_GOAL_LIST]),
                row(&[BTN_BACK]),
            ],
            Self::Analytics => vec![
                row(&[BTN_MONTH, BTN_WEEK]),
                row(&[BTN_TOP, BTN_CHART]),
                row(&[BTN_DETAILED, BTN_BACK]),
            ],
            Self::Settings => vec![
                row(&[BTN_CURRENCY, BTN_NOTIFICATIONS]),
                row(&[BTN_EXPORT, BTN_BACK]),
            ],
            Self::Currencies => vec![row(&["UAH", "USD", "EUR", "GBP"]), row(&[BTN_CANCEL])],
            Self::Cancel => vec![row(&[BTN_CANCEL])],
            Self::Skip => vec![row(&[BTN_SKIP, BTN_CANCEL])],
            Self::Choices(items) => {
                let mut rows: Vec<Vec<String>> = items.chunks(3).map(|c| c.to_vec()).collect();
                rows.push(row(&[BTN_CANCEL]));
                rows
            }
        }
    }
}

/// True when `text` is the given button, with or without its emoji.
pub fn is_button(text: &str, label: &str) -> bool {
    text.trim() == label || normalize_label(text) == normalize_label(label)
}

pub fn is_cancel(text: &str) -> bool {
    matches!(
        normalize_label(text).as_str(),
        "скасувати" | "/cancel" | "cancel" | "відміна" | "скасування"
    )
}

pub fn is_back(text: &str) -> bool {
    is_button(text, BTN_BACK) || matches!(normalize_label(text).as_str(), "назад" | "/menu")
}

pub fn is_skip(text: &str) -> bool {
    matches!(
        normalize_label(text).as_str(),
        "пропустити" | "skip" | "-" | "/skip"
    ) || text.trim() == "-"
}

/// Global entry points: slash commands and main-menu buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Start,
    Help,
    Transaction,
    Budget,
    ListBudgets,
    Goals,
    Analytics,
    Advice(Option<String>),
    Settings,
    Balance,
    History,
}

/// Splits "/cmd@bot rest" into ("/cmd", "rest").
fn split_command(text: &str) -> Option<(String, &str)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let (head, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let cmd = head.split('@').next().unwrap_or(head).to_lowercase();
    Some((cmd, rest.trim()))
}

pub fn entry_point(text: &str) -> Option<Entry> {
    if let Some((cmd, rest)) = split_command(text) {
        let entry = match cmd.as_str() {
            "/start" => Entry::Start,
            "/help" => Entry::Help,
            "/transaction" | "/add" => Entry::Transaction,
            "/budget" => Entry::Budget,
            "/list" => Entry::ListBudgets,
            "/goals" | "/goal" => Entry::Goals,
            "/analytics" => Entry::Analytics,
            "/advice" | "/ask" => {
                Entry::Advice(Some(rest.to_string()).filter(|q| !q.is_empty()))
            }
            "/settings" => Entry::Settings,
            "/balance" => Entry::Balance,
            "/history" => Entry::History,
            _ => return None,
        };
        return Some(entry);
    }
    let text = text.trim();
    let entry = match text {
        BTN_TRANSACTION => Entry::Transaction,
        BTN_BUDGET => Entry::Budget,
        BTN_GOALS => Entry::Goals,
        BTN_ANALYTICS => Entry::Analytics,
        BTN_ADVICE => Entry::Advice(None),
        BTN_SETTINGS => Entry::Settings,
        BTN_BALANCE => Entry::Balance,
        BTN_HISTORY => Entry::History,
        _ => return None,
    };
    Some(entry)
}
