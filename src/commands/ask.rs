// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::advice::{MIN_QUESTION_CHARS, OllamaClient, advise, is_valid_question};
use crate::config::Config;
use anyhow::{Result, bail};

pub fn handle(cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let question = sub
        .get_many::<String>("question")
        .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    if !is_valid_question(&question) {
        bail!("Question must have at least {} characters", MIN_QUESTION_CHARS);
    }
    let client = OllamaClient::new(cfg.advice.clone())?;
    println!("{}", advise(&client, &question));
    Ok(())
}
