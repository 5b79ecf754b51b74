// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-user transaction export, shared by the CLI and the settings menu.

use crate::ledger;
use crate::models::Transaction;
use crate::utils::fmt_ts;
use anyhow::{Result, bail};
use rusqlite::Connection;
use serde_json::json;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => bail!("Unknown format: {} (use csv|json)", other),
        }
    }
}

const HEADERS: [&str; 5] = ["date", "type", "amount", "category", "description"];

pub fn to_csv(txs: &[Transaction]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADERS)?;
    for t in txs {
        wtr.write_record([
            fmt_ts(&t.date),
            t.kind.as_str().to_string(),
            t.amount.to_string(),
            t.category.clone(),
            t.description.clone().unwrap_or_default(),
        ])?;
    }
    Ok(wtr.into_inner().map_err(|e| e.into_error())?)
}

pub fn to_json(txs: &[Transaction]) -> Result<Vec<u8>> {
    let items: Vec<_> = txs
        .iter()
        .map(|t| {
            json!({
                "date": fmt_ts(&t.date),
                "type": t.kind,
                "amount": t.amount.to_string(),
                "category": t.category,
                "description": t.description,
            })
        })
        .collect();
    Ok(serde_json::to_vec_pretty(&items)?)
}

/// All transactions of one user, oldest first, rendered in `format`.
pub fn export_user(conn: &Connection, user_id: i64, format: ExportFormat) -> Result<Vec<u8>> {
    let txs = ledger::transactions_since(conn, user_id, None)?;
    match format {
        ExportFormat::Csv => to_csv(&txs),
        ExportFormat::Json => to_json(&txs),
    }
}
