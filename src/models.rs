// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub registration_date: NaiveDateTime,
    pub last_activity: NaiveDateTime,
    pub currency: String,
    pub budget_alerts: bool,
}

/// Profile fields reported by the chat transport with every message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Income,
    Expense,
    GoalDeposit,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::GoalDeposit => "goal_deposit",
        }
    }

    /// Ukrainian label used in replies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Дохід",
            Self::Expense => "Витрата",
            Self::GoalDeposit => "Внесок у ціль",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "goal_deposit" => Ok(Self::GoalDeposit),
            other => Err(anyhow::anyhow!("Unknown transaction type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub kind: TxKind,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Weekly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
        }
    }

    /// Ukrainian suffix for limit listings, e.g. "3000 на місяць".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Monthly => "на місяць",
            Self::Weekly => "на тиждень",
        }
    }

    /// Period word a user may append to a limit ("тиждень", "weekly", ...).
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "місяць" | "місячний" | "month" | "monthly" => Some(Self::Monthly),
            "тиждень" | "тижневий" | "week" | "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "weekly" => Ok(Self::Weekly),
            other => Err(anyhow::anyhow!("Unknown budget period '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub limit: Decimal,
    pub period: BudgetPeriod,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deposits: Decimal, // cumulative credited deposits
    pub months: u32,
    pub created_at: NaiveDateTime,
    pub description: Option<String>,
}

impl Goal {
    pub fn remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }

    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Progress in percent, 0..=100.
    pub fn progress_pct(&self) -> Decimal {
        if self.target_amount.is_zero() {
            return Decimal::ZERO;
        }
        self.current_amount
            .checked_div(self.target_amount)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ONE_HUNDRED, |pct| pct.min(Decimal::ONE_HUNDRED))
    }

    pub fn monthly_installment(&self) -> Decimal {
        if self.months == 0 {
            return self.target_amount;
        }
        self.target_amount / Decimal::from(self.months)
    }
}

/// Balance split by transaction type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub income: Decimal,
    pub expense: Decimal,
    pub saved: Decimal,
}

impl Balance {
    /// Spendable balance: goal deposits are money set aside, so they reduce it.
    pub fn total(&self) -> anyhow::Result<Decimal> {
        self.income
            .checked_sub(self.expense)
            .and_then(|d| d.checked_sub(self.saved))
            .ok_or_else(|| anyhow::anyhow!("Balance total overflowed"))
    }
}
