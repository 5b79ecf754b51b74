// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Balance, Transaction, TxKind};
use crate::utils::{fmt_ts, now, parse_decimal, parse_ts};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use tracing::debug;

const TX_COLUMNS: &str = "id, user_id, amount, type, category, description, date";

fn tx_from_row(r: &Row<'_>) -> Result<Transaction> {
    let amount_s: String = r.get(2)?;
    let kind_s: String = r.get(3)?;
    let date_s: String = r.get(6)?;
    Ok(Transaction {
        id: r.get(0)?,
        user_id: r.get(1)?,
        amount: parse_decimal(&amount_s)
            .with_context(|| format!("Invalid amount '{}' in transactions", amount_s))?,
        kind: kind_s.parse()?,
        category: r.get(4)?,
        description: r.get(5)?,
        date: parse_ts(&date_s)?,
    })
}

/// Inserts one immutable transaction and returns its id. Categories are
/// case-folded before storage.
pub fn add_transaction(
    conn: &Connection,
    user_id: i64,
    amount: Decimal,
    kind: TxKind,
    category: &str,
    description: Option<&str>,
) -> Result<i64> {
    add_transaction_at(conn, user_id, amount, kind, category, description, now())
}

pub fn add_transaction_at(
    conn: &Connection,
    user_id: i64,
    amount: Decimal,
    kind: TxKind,
    category: &str,
    description: Option<&str>,
    date: NaiveDateTime,
) -> Result<i64> {
    let category = category.trim().to_lowercase();
    conn.execute(
        "INSERT INTO transactions(user_id, amount, type, category, description, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            amount.to_string(),
            kind.as_str(),
            category,
            description,
            fmt_ts(&date)
        ],
    )
    .with_context(|| format!("Insert {} transaction for user {}", kind, user_id))?;
    let id = conn.last_insert_rowid();
    debug!(user_id, tx_id = id, %amount, %kind, category = %category, "transaction recorded");
    Ok(id)
}

/// Most recent first, at most `limit` rows.
pub fn get_transactions(conn: &Connection, user_id: i64, limit: usize) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TX_COLUMNS} FROM transactions WHERE user_id=?1 ORDER BY date DESC, id DESC LIMIT ?2"
    ))?;
    let mut rows = stmt.query(params![user_id, limit as i64])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(tx_from_row(r)?);
    }
    Ok(data)
}

/// Every transaction of the user dated on or after `since` (all of them when
/// `since` is `None`), oldest first.
pub fn transactions_since(
    conn: &Connection,
    user_id: i64,
    since: Option<NaiveDateTime>,
) -> Result<Vec<Transaction>> {
    let since = since.map(|d| fmt_ts(&d)).unwrap_or_default();
    let mut stmt = conn.prepare(&format!(
        "SELECT {TX_COLUMNS} FROM transactions WHERE user_id=?1 AND date>=?2 ORDER BY date, id"
    ))?;
    let mut rows = stmt.query(params![user_id, since])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(tx_from_row(r)?);
    }
    Ok(data)
}

pub fn get_balance(conn: &Connection, user_id: i64) -> Result<Balance> {
    let mut stmt = conn.prepare("SELECT type, amount FROM transactions WHERE user_id=?1")?;
    let mut rows = stmt.query(params![user_id])?;
    let mut bal = Balance::default();
    while let Some(r) = rows.next()? {
        let kind: TxKind = r.get::<_, String>(0)?.parse()?;
        let amt_s: String = r.get(1)?;
        let amt = parse_decimal(&amt_s)?;
        let slot = match kind {
            TxKind::Income => &mut bal.income,
            TxKind::Expense => &mut bal.expense,
            TxKind::GoalDeposit => &mut bal.saved,
        };
        *slot = slot
            .checked_add(amt)
            .with_context(|| format!("Balance of user {} overflowed", user_id))?;
    }
    Ok(bal)
}

/// Total expense for one category in `[from, to)`.
pub fn spent_in_period(
    conn: &Connection,
    user_id: i64,
    category: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions
         WHERE user_id=?1 AND type='expense' AND category=?2 AND date>=?3 AND date<?4",
    )?;
    let mut rows = stmt.query(params![
        user_id,
        category.trim().to_lowercase(),
        fmt_ts(&from),
        fmt_ts(&to)
    ])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let amt_s: String = r.get(0)?;
        total = total
            .checked_add(parse_decimal(&amt_s)?)
            .context("Spending total overflowed")?;
    }
    Ok(total)
}

/// Distinct categories of one type, most recently used first.
pub fn recent_categories(
    conn: &Connection,
    user_id: i64,
    kind: TxKind,
    limit: usize,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT category FROM transactions WHERE user_id=?1 AND type=?2
         GROUP BY category ORDER BY MAX(id) DESC LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![user_id, kind.as_str(), limit as i64], |r| {
        r.get::<_, String>(0)
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
