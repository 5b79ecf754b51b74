// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::menus::Keyboard;
use super::{Ctx, Reply, State, Turn};
use crate::advice::{MIN_QUESTION_CHARS, advise, is_valid_question};
use anyhow::Result;
use tracing::info;

pub const ANSWER_HEADER: &str = "🤖 FinWise Owl AI:";

fn stay(reply: Reply) -> Turn {
    Turn::to(State::Advice, reply.with_keyboard(Keyboard::Cancel))
}

/// `/advice` on its own opens the prompt; `/advice <question>` is answered
/// right away.
pub fn start(ctx: &mut Ctx<'_>, question: Option<&str>) -> Turn {
    match question.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => answer(ctx, q),
        None => stay(Reply::plain(
            "🤖 Задайте своє фінансове запитання, і я постараюсь допомогти.\n\
             Наприклад: «Як скласти бюджет на місяць?»",
        )),
    }
}

pub fn handle(ctx: &mut Ctx<'_>, text: &str) -> Result<Turn> {
    Ok(answer(ctx, text))
}

fn answer(ctx: &mut Ctx<'_>, question: &str) -> Turn {
    if !is_valid_question(question) {
        return stay(Reply::plain(format!(
            "Будь ласка, введіть коректне запитання (не менше {} символів).",
            MIN_QUESTION_CHARS
        )));
    }
    info!(user_id = ctx.user.id, chars = question.chars().count(), "advice requested");
    let answer = advise(ctx.advisor, question);
    stay(Reply::plain(format!("{ANSWER_HEADER}\n\n{answer}")))
}
