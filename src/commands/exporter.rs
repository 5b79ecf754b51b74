// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::export::{ExportFormat, export_user};
use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user_id = *sub.get_one::<i64>("user").context("--user is required")?;
    let out = sub.get_one::<String>("out").context("--out is required")?;
    let format: ExportFormat = sub
        .get_one::<String>("format")
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or_default();

    let bytes = export_user(conn, user_id, format)?;
    std::fs::write(out, &bytes).with_context(|| format!("Write export to {}", out))?;
    info!(user_id, out = %out, bytes = bytes.len(), "export written");
    println!("Exported transactions of user {} to {}", user_id, out);
    Ok(())
}
