// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::transactions::add_transaction;
use crate::models::{Goal, TxKind};
use crate::utils::{fmt_ts, now, parse_decimal, parse_ts};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rust_decimal::Decimal;
use tracing::info;

const GOAL_COLUMNS: &str =
    "id, user_id, name, target_amount, current_amount, deposits, months, created_at, description";

fn goal_from_row(r: &Row<'_>) -> Result<Goal> {
    let target: String = r.get(3)?;
    let current: String = r.get(4)?;
    let deposits: String = r.get(5)?;
    let created: String = r.get(7)?;
    Ok(Goal {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        target_amount: parse_decimal(&target)?,
        current_amount: parse_decimal(&current)?,
        deposits: parse_decimal(&deposits)?,
        months: r.get(6)?,
        created_at: parse_ts(&created)?,
        description: r.get(8)?,
    })
}

fn get_goal(conn: &Connection, user_id: i64, goal_id: i64) -> Result<Option<Goal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE id=?1 AND user_id=?2"
    ))?;
    let mut rows = stmt.query(params![goal_id, user_id])?;
    match rows.next()? {
        Some(r) => Ok(Some(goal_from_row(r)?)),
        None => Ok(None),
    }
}

pub fn create_goal(
    conn: &Connection,
    user_id: i64,
    name: &str,
    target: Decimal,
    months: u32,
    description: Option<&str>,
) -> Result<Goal> {
    conn.execute(
        "INSERT INTO goals(user_id, name, target_amount, current_amount, deposits, months, created_at, description)
         VALUES (?1, ?2, ?3, '0', '0', ?4, ?5, ?6)",
        params![
            user_id,
            name.trim(),
            target.to_string(),
            months,
            fmt_ts(&now()),
            description
        ],
    )
    .with_context(|| format!("Create goal '{}' for user {}", name, user_id))?;
    let id = conn.last_insert_rowid();
    info!(user_id, goal_id = id, %target, months, "goal created");
    get_goal(conn, user_id, id)?.context("Goal missing right after insert")
}

/// Goals in creation order; list positions shown to the user follow this order.
pub fn list_goals(conn: &Connection, user_id: i64) -> Result<Vec<Goal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id=?1 ORDER BY id"
    ))?;
    let mut rows = stmt.query(params![user_id])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(goal_from_row(r)?);
    }
    Ok(data)
}

#[derive(Debug, Clone)]
pub enum DepositOutcome {
    /// `credited` went into the goal; `overflow` is the part above the target
    /// that was not taken.
    Credited {
        goal: Goal,
        credited: Decimal,
        overflow: Decimal,
    },
    AlreadyReached(Goal),
    NotFound,
}

/// Adds money to a goal, never past its target. The goal update and the
/// matching `goal_deposit` transaction commit together.
pub fn deposit(
    conn: &mut Connection,
    user_id: i64,
    goal_id: i64,
    amount: Decimal,
) -> Result<DepositOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let Some(goal) = get_goal(&tx, user_id, goal_id)? else {
        return Ok(DepositOutcome::NotFound);
    };
    let remaining = goal.remaining();
    if remaining.is_zero() {
        return Ok(DepositOutcome::AlreadyReached(goal));
    }
    let credited = amount.min(remaining);
    let overflow = amount - credited;

    tx.execute(
        "UPDATE goals SET current_amount=?3, deposits=?4 WHERE id=?1 AND user_id=?2",
        params![
            goal_id,
            user_id,
            (goal.current_amount + credited).to_string(),
            (goal.deposits + credited).to_string()
        ],
    )?;
    add_transaction(
        &tx,
        user_id,
        credited,
        TxKind::GoalDeposit,
        &goal.name,
        Some("поповнення цілі"),
    )?;
    let updated = get_goal(&tx, user_id, goal_id)?.context("Goal missing after deposit")?;
    tx.commit()?;
    info!(user_id, goal_id, %credited, %overflow, "goal deposit");
    Ok(DepositOutcome::Credited {
        goal: updated,
        credited,
        overflow,
    })
}

/// Removes the goal; its past deposit transactions stay in the history.
pub fn delete_goal(conn: &Connection, user_id: i64, goal_id: i64) -> Result<Option<String>> {
    let name: Option<String> = conn
        .query_row(
            "SELECT name FROM goals WHERE id=?1 AND user_id=?2",
            params![goal_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    if name.is_some() {
        conn.execute(
            "DELETE FROM goals WHERE id=?1 AND user_id=?2",
            params![goal_id, user_id],
        )?;
        info!(user_id, goal_id, "goal deleted");
    }
    Ok(name)
}
