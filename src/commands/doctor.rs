// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::advice::OllamaClient;
use crate::config::Config;
use crate::utils::{MAX_AMOUNT, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

/// Rows of (issue, detail) found in the database.
pub fn check_data(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Rows pointing at users that do not exist
    for (table, label) in [
        ("transactions", "orphan_transaction"),
        ("budgets", "orphan_budget"),
        ("goals", "orphan_goal"),
    ] {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, user_id FROM {table} WHERE user_id NOT IN (SELECT id FROM users)"
        ))?;
        let mut cur = stmt.query([])?;
        while let Some(r) = cur.next()? {
            let id: i64 = r.get(0)?;
            let user: i64 = r.get(1)?;
            rows.push(vec![label.into(), format!("id {} (user {})", id, user)]);
        }
    }

    // 2) Goals whose saved amount went past the target
    let mut stmt =
        conn.prepare("SELECT id, user_id, name, target_amount, current_amount FROM goals")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let user: i64 = r.get(1)?;
        let name: String = r.get(2)?;
        let target = parse_decimal(&r.get::<_, String>(3)?)?;
        let current = parse_decimal(&r.get::<_, String>(4)?)?;
        if current > target {
            rows.push(vec![
                "goal_over_target".into(),
                format!("id {} '{}' (user {}): {} > {}", id, name, user, current, target),
            ]);
        }
    }

    // 3) More than one limit for the same category
    let mut stmt = conn.prepare(
        "SELECT user_id, category, COUNT(*) FROM budgets GROUP BY user_id, category HAVING COUNT(*) > 1",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let user: i64 = r.get(0)?;
        let category: String = r.get(1)?;
        let n: i64 = r.get(2)?;
        rows.push(vec![
            "duplicate_budget".into(),
            format!("user {} '{}' x{}", user, category, n),
        ]);
    }

    // 4) Amounts that are not positive decimals or exceed the input cap
    let mut stmt = conn.prepare("SELECT id, amount FROM transactions")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let amount: String = r.get(1)?;
        match parse_decimal(&amount) {
            Ok(d) if d.is_sign_positive() && !d.is_zero() && d <= MAX_AMOUNT => {}
            _ => rows.push(vec!["bad_amount".into(), format!("transaction {}: '{}'", id, amount)]),
        }
    }
    Ok(rows)
}

pub fn handle(conn: &Connection, cfg: &Config) -> Result<()> {
    let mut rows = check_data(conn)?;

    if cfg.telegram_token.is_none() {
        rows.push(vec!["missing_token".into(), "TELEGRAM_TOKEN is not set".into()]);
    }
    let client = OllamaClient::new(cfg.advice.clone())?;
    if !client.is_available() {
        rows.push(vec![
            "advice_unreachable".into(),
            format!("{} (model {})", cfg.advice.host, cfg.advice.model),
        ]);
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
