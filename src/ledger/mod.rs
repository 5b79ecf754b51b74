// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence-facing operations. Every function takes the connection it
//! works on; callers decide how failures reach the user.

pub mod budgets;
pub mod goals;
pub mod transactions;
pub mod users;

pub use budgets::{BudgetStatus, budget_status, list_budgets, upsert_budget};
pub use goals::{DepositOutcome, create_goal, delete_goal, deposit, list_goals};
pub use transactions::{
    add_transaction, add_transaction_at, get_balance, get_transactions, recent_categories,
    spent_in_period, transactions_since,
};
pub use users::{get_or_create_user, get_user, set_currency, toggle_budget_alerts};
