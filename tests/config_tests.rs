// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use finwise::config::{
    Config, ConfigError, DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL, SessionBackend,
    database_path_from_url,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|k| env.get(k).cloned())
}

#[test]
fn defaults_apply_when_unset() {
    let cfg = load(&[]).unwrap();
    assert_eq!(cfg.advice.host, DEFAULT_OLLAMA_HOST);
    assert_eq!(cfg.advice.model, DEFAULT_OLLAMA_MODEL);
    assert_eq!(cfg.advice.timeout, Duration::from_secs(60));
    assert_eq!(cfg.sessions, SessionBackend::Sqlite);
    assert!(cfg.database_path.is_none());
    assert!(matches!(cfg.require_token(), Err(ConfigError::MissingToken)));
}

#[test]
fn reads_every_variable() {
    let cfg = load(&[
        ("TELEGRAM_TOKEN", " 123:abc "),
        ("DB_URL", "sqlite:///data/finance_bot.db"),
        ("OLLAMA_HOST", "http://127.0.0.1:11434"),
        ("OLLAMA_MODEL", "mistral"),
        ("OLLAMA_TIMEOUT", "15"),
        ("SESSION_STORE", "memory"),
    ])
    .unwrap();
    assert_eq!(cfg.require_token().unwrap(), "123:abc");
    assert_eq!(cfg.database_path, Some(PathBuf::from("data/finance_bot.db")));
    assert_eq!(cfg.advice.host, "http://127.0.0.1:11434");
    assert_eq!(cfg.advice.model, "mistral");
    assert_eq!(cfg.advice.timeout, Duration::from_secs(15));
    assert_eq!(cfg.sessions, SessionBackend::Memory);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(matches!(
        load(&[("OLLAMA_TIMEOUT", "soon")]),
        Err(ConfigError::Invalid { key: "OLLAMA_TIMEOUT", .. })
    ));
    assert!(matches!(
        load(&[("SESSION_STORE", "redis")]),
        Err(ConfigError::Invalid { key: "SESSION_STORE", .. })
    ));
}

#[test]
fn database_urls() {
    assert_eq!(database_path_from_url("sqlite:///finance_bot.db"), PathBuf::from("finance_bot.db"));
    assert_eq!(database_path_from_url("sqlite://x.db"), PathBuf::from("x.db"));
    assert_eq!(database_path_from_url("/var/lib/bot.db"), PathBuf::from("/var/lib/bot.db"));
}
