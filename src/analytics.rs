// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-side reports over transactions that were already fetched. Nothing
//! here touches the database.

use crate::models::{Transaction, TxKind};
use crate::utils::{
    capitalize, checked_sum, escape_html, fmt_money, month_key, month_start, prev_month_start,
    week_start,
};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{BTreeMap, HashMap};

pub const CHART_MONTHS: usize = 6;
const CHART_WIDTH: usize = 20;
const HIGH_MONTHLY_SPEND: i64 = 15_000;
const LOW_MONTHLY_SPEND: i64 = 5_000;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub total: Decimal,
    pub percent: Decimal,
}

fn expenses(txs: &[Transaction]) -> impl Iterator<Item = &Transaction> {
    txs.iter().filter(|t| t.kind == TxKind::Expense)
}

fn total(txs: &[&Transaction]) -> Result<Decimal> {
    checked_sum(txs.iter().map(|t| t.amount))
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Groups the given transactions by category, largest first. Percentages are
/// of the grand total of the input.
pub fn category_breakdown(txs: &[&Transaction]) -> Result<Vec<CategoryShare>> {
    let grand = total(txs)?;
    let mut agg: HashMap<&str, Decimal> = HashMap::new();
    for t in txs {
        let sum = agg.entry(t.category.as_str()).or_insert(Decimal::ZERO);
        *sum = sum
            .checked_add(t.amount)
            .with_context(|| format!("Total of category '{}' overflowed", t.category))?;
    }
    let mut items: Vec<CategoryShare> = agg
        .into_iter()
        .map(|(category, total)| CategoryShare {
            category: category.to_string(),
            total,
            percent: percent_of(total, grand),
        })
        .collect();
    items.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    Ok(items)
}

fn expenses_between(txs: &[Transaction], from: NaiveDate, to: Option<NaiveDate>) -> Vec<&Transaction> {
    expenses(txs)
        .filter(|t| {
            let d = t.date.date();
            d >= from && to.is_none_or(|to| d < to)
        })
        .collect()
}

fn push_shares(out: &mut String, shares: &[CategoryShare], ccy: &str) {
    for s in shares {
        out.push_str(&format!(
            "▪ {}: {} ({:.1}%)\n",
            escape_html(&capitalize(&s.category)),
            fmt_money(&s.total, ccy),
            s.percent
        ));
    }
}

/// Current month by category, with the trend against the previous month.
pub fn monthly_report(txs: &[Transaction], today: NaiveDate, ccy: &str) -> Result<String> {
    let start = month_start(today);
    let current = expenses_between(txs, start, None);
    if current.is_empty() {
        return Ok("📭 У вас ще немає витрат за цей місяць.".to_string());
    }
    let sum = total(&current)?;
    let mut report = format!("📅 <b>Витрати за {}:</b>\n\n", month_key(today));
    report.push_str(&format!("💵 <b>Загалом:</b> {}\n\n", fmt_money(&sum, ccy)));
    report.push_str("<b>Розподіл по категоріям:</b>\n");
    push_shares(&mut report, &category_breakdown(&current)?, ccy);

    let prev_start = prev_month_start(today);
    let prev_total = total(&expenses_between(txs, prev_start, Some(start)))?;
    if !prev_total.is_zero() {
        let prev_key = month_key(prev_start);
        // Both totals are non-negative, so the difference cannot overflow.
        let diff = sum - prev_total;
        let trend = if diff > Decimal::ZERO {
            format!("📈 <b>+{}</b> vs {}", fmt_money(&diff.abs(), ccy), prev_key)
        } else if diff < Decimal::ZERO {
            format!("📉 <b>-{}</b> vs {}", fmt_money(&diff.abs(), ccy), prev_key)
        } else {
            format!("📊 <b>Без змін</b> vs {}", prev_key)
        };
        report.push('\n');
        report.push_str(&trend);
    }
    Ok(report)
}

/// Week starting Monday, plus the average spend per elapsed day.
pub fn weekly_report(txs: &[Transaction], today: NaiveDate, ccy: &str) -> Result<String> {
    let start = week_start(today);
    let current = expenses_between(txs, start, None);
    if current.is_empty() {
        return Ok("📭 У вас ще немає витрат за цей тиждень.".to_string());
    }
    let sum = total(&current)?;
    let mut report = format!("📆 <b>Витрати за тиждень (з {}):</b>\n\n", start);
    report.push_str(&format!("💵 <b>Загалом:</b> {}\n\n", fmt_money(&sum, ccy)));
    report.push_str("<b>Розподіл по категоріям:</b>\n");
    push_shares(&mut report, &category_breakdown(&current)?, ccy);
    let days = Decimal::from(today.weekday().num_days_from_monday() + 1);
    report.push_str(&format!(
        "\n📌 <b>Середньоденні витрати:</b> {}",
        fmt_money(&(sum / days), ccy)
    ));
    Ok(report)
}

/// Ten largest expense categories of all time.
pub fn top_categories(txs: &[Transaction], ccy: &str) -> Result<String> {
    let all: Vec<&Transaction> = expenses(txs).collect();
    if all.is_empty() {
        return Ok("📭 У вас ще немає витрат за жодною категорією.".to_string());
    }
    let mut report = String::from("📊 <b>Топ-10 категорій за весь час:</b>\n\n");
    for (i, s) in category_breakdown(&all)?.iter().take(10).enumerate() {
        report.push_str(&format!(
            "{}. {}: {} ({:.1}%)\n",
            i + 1,
            escape_html(&capitalize(&s.category)),
            fmt_money(&s.total, ccy),
            s.percent
        ));
    }
    report.push_str(&format!(
        "\n💳 <b>Всього витрачено:</b> {}",
        fmt_money(&total(&all)?, ccy)
    ));
    Ok(report)
}

/// Expense totals for the last months that have data, oldest first.
pub fn monthly_totals(txs: &[Transaction], months: usize) -> Result<Vec<(String, Decimal)>> {
    let mut by_month: BTreeMap<String, Decimal> = BTreeMap::new();
    for t in expenses(txs) {
        let key = month_key(t.date.date());
        let sum = by_month.entry(key.clone()).or_insert(Decimal::ZERO);
        *sum = sum
            .checked_add(t.amount)
            .with_context(|| format!("Expense total of {} overflowed", key))?;
    }
    let mut items: Vec<(String, Decimal)> = by_month.into_iter().rev().take(months).collect();
    items.reverse();
    Ok(items)
}

/// Text bar chart of the last six months. `None` when fewer than two months
/// have any expenses.
pub fn expense_chart(txs: &[Transaction], ccy: &str) -> Result<Option<String>> {
    let data = monthly_totals(txs, CHART_MONTHS)?;
    if data.len() < 2 {
        return Ok(None);
    }
    let max = data.iter().map(|(_, v)| *v).max().unwrap_or(Decimal::ZERO);
    let mut chart = String::from("📈 <b>Динаміка ваших витрат</b>\n<pre>");
    for (month, value) in &data {
        // "2025-08" -> "08/25"
        let label = format!("{}/{}", &month[5..7], &month[2..4]);
        let width = (percent_of(*value, max) * Decimal::from(CHART_WIDTH as u32)
            / Decimal::ONE_HUNDRED)
            .round()
            .to_usize()
            .unwrap_or(0);
        chart.push_str(&format!(
            "{} {:<w$} {:.0}\n",
            label,
            "█".repeat(width.max(1)),
            value,
            w = CHART_WIDTH
        ));
    }
    chart.push_str(&format!("</pre>Сума, {}", crate::utils::currency_symbol(ccy)));
    Ok(Some(chart))
}

/// Totals, monthly average, heaviest category and a short recommendation.
pub fn detailed_analysis(txs: &[Transaction], ccy: &str) -> Result<String> {
    let all: Vec<&Transaction> = expenses(txs).collect();
    let spent = total(&all)?;
    let months = monthly_totals(txs, usize::MAX)?;
    let avg_monthly = if months.is_empty() {
        Decimal::ZERO
    } else {
        spent / Decimal::from(months.len() as u64)
    };

    let mut analysis = String::from("🔍 <b>Детальний фінансовий аналіз:</b>\n\n");
    analysis.push_str(&format!("💸 <b>Всього витрачено:</b> {}\n", fmt_money(&spent, ccy)));
    analysis.push_str(&format!(
        "📆 <b>Середньомісячні витрати:</b> {}\n",
        fmt_money(&avg_monthly, ccy)
    ));
    if let Some(top) = category_breakdown(&all)?.first() {
        analysis.push_str(&format!(
            "🏆 <b>Найвитратніша категорія:</b> {} ({})\n",
            escape_html(&capitalize(&top.category)),
            fmt_money(&top.total, ccy)
        ));
    }
    let tip = if avg_monthly > Decimal::from(HIGH_MONTHLY_SPEND) {
        "Ваші витрати вище середнього. Рекомендуємо переглянути бюджет."
    } else if avg_monthly < Decimal::from(LOW_MONTHLY_SPEND) {
        "Ви добре контролюєте витрати! Продовжуйте в тому ж дусі."
    } else {
        "Ваші витрати на оптимальному рівні."
    };
    analysis.push_str(&format!("\n💡 <b>Рекомендація:</b> {}", tip));
    Ok(analysis)
}
