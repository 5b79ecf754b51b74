// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use finwise::{cli, commands, config::Config, db};

fn main() -> Result<()> {
    let cfg = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let matches = cli::build_cli().get_matches();
    let db_path = match matches.get_one::<PathBuf>("db") {
        Some(p) => p.clone(),
        None => match &cfg.database_path {
            Some(p) => p.clone(),
            None => db::default_db_path()?,
        },
    };

    match matches.subcommand() {
        Some(("init", _)) => {
            db::open_or_init(&db_path)?;
            println!("Database initialized at {}", db_path.display());
        }
        Some(("run", _)) => commands::bot::handle(&cfg, &db_path)?,
        Some(("doctor", _)) => {
            let conn = db::open_or_init(&db_path)?;
            commands::doctor::handle(&conn, &cfg)?;
        }
        Some(("ask", sub)) => commands::ask::handle(&cfg, sub)?,
        Some(("export", sub)) => {
            let conn = db::open_or_init(&db_path)?;
            commands::exporter::handle(&conn, sub)?;
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
