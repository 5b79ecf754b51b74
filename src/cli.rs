// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;

pub fn build_cli() -> Command {
    Command::new("finwise")
        .about("FinWise Owl: personal finance assistant for Telegram")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("SQLite database file (overrides DB_URL)"),
        )
        .subcommand(Command::new("init").about("Create the database schema"))
        .subcommand(Command::new("run").about("Start the bot (long polling)"))
        .subcommand(Command::new("doctor").about("Check data consistency and the advice service"))
        .subcommand(
            Command::new("ask")
                .about("Ask the advice service one question")
                .arg(
                    Arg::new("question")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export one user's transactions")
                .arg(
                    Arg::new("user")
                        .long("user")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("out").long("out").required(true))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("csv")
                        .value_parser(["csv", "json"]),
                ),
        )
}
