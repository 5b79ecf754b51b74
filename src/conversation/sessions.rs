// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Keyed storage for conversation state: user id -> [`State`], drafts included.

use super::State;
use crate::db::init_schema;
use crate::utils::{fmt_ts, now};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;

pub trait SessionStore {
    fn load(&mut self, user_id: i64) -> Result<State>;
    /// Saving [`State::Idle`] drops whatever was stored for the user.
    fn save(&mut self, user_id: i64, state: &State) -> Result<()>;
}

/// Process-local store; lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessions {
    states: HashMap<i64, State>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl SessionStore for MemorySessions {
    fn load(&mut self, user_id: i64) -> Result<State> {
        Ok(self.states.get(&user_id).cloned().unwrap_or_default())
    }

    fn save(&mut self, user_id: i64, state: &State) -> Result<()> {
        if *state == State::Idle {
            self.states.remove(&user_id);
        } else {
            self.states.insert(user_id, state.clone());
        }
        Ok(())
    }
}

/// Store backed by the `sessions` table, so half-filled forms survive a restart.
pub struct SqliteSessions {
    conn: Connection,
}

impl SqliteSessions {
    pub fn new(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Open session DB at {}", path.display()))?;
        Self::new(conn)
    }
}

impl SessionStore for SqliteSessions {
    fn load(&mut self, user_id: i64) -> Result<State> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT state FROM sessions WHERE user_id=?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        match raw {
            Some(s) => serde_json::from_str(&s)
                .with_context(|| format!("Corrupt session for user {}", user_id)),
            None => Ok(State::Idle),
        }
    }

    fn save(&mut self, user_id: i64, state: &State) -> Result<()> {
        if *state == State::Idle {
            self.conn
                .execute("DELETE FROM sessions WHERE user_id=?1", params![user_id])?;
            return Ok(());
        }
        let json = serde_json::to_string(state)?;
        self.conn.execute(
            "INSERT INTO sessions(user_id, state, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET state=excluded.state, updated_at=excluded.updated_at",
            params![user_id, json, fmt_ts(&now())],
        )?;
        Ok(())
    }
}
