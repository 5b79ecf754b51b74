// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod advice;
pub mod analytics;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod db;
pub mod export;
pub mod ledger;
pub mod models;
pub mod telegram;
pub mod utils;
