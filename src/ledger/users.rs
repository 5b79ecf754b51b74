// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Profile, User};
use crate::utils::{fmt_ts, now, parse_ts};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

pub const DEFAULT_CURRENCY: &str = "UAH";
pub const SUPPORTED_CURRENCIES: [&str; 4] = ["UAH", "USD", "EUR", "GBP"];

const USER_COLUMNS: &str = "id, username, first_name, last_name, language_code, registration_date, last_activity, currency, budget_alerts";

fn user_from_row(r: &Row<'_>) -> Result<User> {
    let registered: String = r.get(5)?;
    let active: String = r.get(6)?;
    Ok(User {
        id: r.get(0)?,
        username: r.get(1)?,
        first_name: r.get(2)?,
        last_name: r.get(3)?,
        language_code: r.get(4)?,
        registration_date: parse_ts(&registered)?,
        last_activity: parse_ts(&active)?,
        currency: r.get(7)?,
        budget_alerts: r.get::<_, i64>(8)? != 0,
    })
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id=?1"))?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(r) => Ok(Some(user_from_row(r)?)),
        None => Ok(None),
    }
}

/// Looks the user up by chat identity, creating the row on first contact.
/// On every later call the profile fields and `last_activity` are refreshed.
pub fn get_or_create_user(conn: &Connection, id: i64, profile: &Profile) -> Result<User> {
    let ts = fmt_ts(&now());
    let inserted = conn
        .execute(
            "INSERT INTO users(id, username, first_name, last_name, language_code, registration_date, last_activity, currency)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)
             ON CONFLICT(id) DO NOTHING",
            params![
                id,
                profile.username,
                profile.first_name,
                profile.last_name,
                profile.language_code,
                ts,
                DEFAULT_CURRENCY
            ],
        )
        .with_context(|| format!("Insert user {}", id))?;
    if inserted == 1 {
        info!(user_id = id, "new user registered");
    } else {
        conn.execute(
            "UPDATE users SET last_activity=?2, username=?3, first_name=?4, last_name=?5,
                language_code=COALESCE(?6, language_code)
             WHERE id=?1",
            params![
                id,
                ts,
                profile.username,
                profile.first_name,
                profile.last_name,
                profile.language_code
            ],
        )
        .with_context(|| format!("Touch user {}", id))?;
    }
    get_user(conn, id)?.with_context(|| format!("User {} vanished after upsert", id))
}

pub fn set_currency(conn: &Connection, id: i64, ccy: &str) -> Result<bool> {
    let n = conn.execute(
        "UPDATE users SET currency=?2 WHERE id=?1",
        params![id, ccy],
    )?;
    Ok(n == 1)
}

/// Flips the budget-limit alert flag and returns the new value.
pub fn toggle_budget_alerts(conn: &Connection, id: i64) -> Result<bool> {
    conn.execute(
        "UPDATE users SET budget_alerts = 1 - budget_alerts WHERE id=?1",
        params![id],
    )?;
    let v: Option<i64> = conn
        .query_row(
            "SELECT budget_alerts FROM users WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    let v = v.with_context(|| format!("User {} not found", id))?;
    Ok(v != 0)
}
