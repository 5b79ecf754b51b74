// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::transactions::spent_in_period;
use crate::models::{Budget, BudgetPeriod};
use crate::utils::{fmt_ts, now, parse_decimal, parse_ts, week_start};
use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;

fn budget_from_row(r: &Row<'_>) -> Result<Budget> {
    let limit_s: String = r.get(3)?;
    let period_s: String = r.get(4)?;
    let created: String = r.get(5)?;
    let updated: String = r.get(6)?;
    Ok(Budget {
        id: r.get(0)?,
        user_id: r.get(1)?,
        category: r.get(2)?,
        limit: parse_decimal(&limit_s)
            .with_context(|| format!("Invalid budget limit '{}'", limit_s))?,
        period: period_s.parse()?,
        created_at: parse_ts(&created)?,
        updated_at: parse_ts(&updated)?,
    })
}

/// Sets the limit for (user, category); an existing row is overwritten in a
/// single statement, so there is never more than one row per pair.
pub fn upsert_budget(
    conn: &Connection,
    user_id: i64,
    category: &str,
    limit: Decimal,
    period: BudgetPeriod,
) -> Result<Budget> {
    let category = category.trim().to_lowercase();
    let ts = fmt_ts(&now());
    conn.execute(
        r#"INSERT INTO budgets(user_id, category, "limit", period, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)
         ON CONFLICT(user_id, category) DO UPDATE SET
            "limit"=excluded."limit", period=excluded.period, updated_at=excluded.updated_at"#,
        params![user_id, category, limit.to_string(), period.as_str(), ts],
    )
    .with_context(|| format!("Upsert budget '{}' for user {}", category, user_id))?;
    let budget = conn.query_row(
        r#"SELECT id, user_id, category, "limit", period, created_at, updated_at
           FROM budgets WHERE user_id=?1 AND category=?2"#,
        params![user_id, category],
        |r| Ok(budget_from_row(r)),
    )??;
    Ok(budget)
}

pub fn list_budgets(conn: &Connection, user_id: i64) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, user_id, category, "limit", period, created_at, updated_at
           FROM budgets WHERE user_id=?1 ORDER BY category"#,
    )?;
    let mut rows = stmt.query(params![user_id])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(budget_from_row(r)?);
    }
    Ok(data)
}

#[derive(Debug, Clone)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub spent: Decimal,
}

impl BudgetStatus {
    pub fn used_pct(&self) -> Decimal {
        if self.budget.limit.is_zero() {
            return Decimal::ZERO;
        }
        // Saturates: an absurd overspend still reads as exceeded.
        self.spent
            .checked_div(self.budget.limit)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
    }

    pub fn is_exceeded(&self) -> bool {
        self.spent > self.budget.limit
    }
}

/// `[start, end)` of the budget period containing `today`.
pub fn period_bounds(period: BudgetPeriod, today: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let (start, end) = match period {
        BudgetPeriod::Monthly => {
            let start = today.with_day(1).unwrap_or(today);
            let end = if start.month() == 12 {
                NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
            }
            .unwrap_or(start + Duration::days(31));
            (start, end)
        }
        BudgetPeriod::Weekly => {
            let start = week_start(today);
            (start, start + Duration::days(7))
        }
    };
    (
        start.and_hms_opt(0, 0, 0).unwrap_or_default(),
        end.and_hms_opt(0, 0, 0).unwrap_or_default(),
    )
}

/// Spending against every limit of the user for the current period.
pub fn budget_status(conn: &Connection, user_id: i64, today: NaiveDate) -> Result<Vec<BudgetStatus>> {
    let mut out = Vec::new();
    for budget in list_budgets(conn, user_id)? {
        let (from, to) = period_bounds(budget.period, today);
        let spent = spent_in_period(conn, user_id, &budget.category, from, to)?;
        out.push(BudgetStatus { budget, spent });
    }
    Ok(out)
}
