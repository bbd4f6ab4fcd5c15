// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::path::PathBuf;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::PULSE_CONFIG, "PULSE_CONFIG");
    assert_eq!(vars::PULSE_BASE_URL, "PULSE_BASE_URL");
    assert_eq!(vars::PULSE_TOKEN, "PULSE_TOKEN");
    assert_eq!(vars::PULSE_STATE_DIR, "PULSE_STATE_DIR");
    assert_eq!(vars::XDG_STATE_HOME, "XDG_STATE_HOME");
}

#[test]
fn test_token_unset() {
    std::env::remove_var("PULSE_TOKEN");
    assert!(token().is_none());
}

#[test]
fn test_token_blank_is_unset() {
    std::env::set_var("PULSE_TOKEN", "   ");
    assert!(token().is_none());
    std::env::remove_var("PULSE_TOKEN");
}

#[test]
fn test_state_dir_set() {
    std::env::set_var("PULSE_STATE_DIR", "/tmp/pulse-state");
    assert_eq!(state_dir(), Some(PathBuf::from("/tmp/pulse-state")));
    std::env::remove_var("PULSE_STATE_DIR");
}

#[test]
fn test_numeric_var_parsed() {
    std::env::set_var("PULSE_RECONNECT_DELAY_MS", " 2500 ");
    assert_eq!(reconnect_delay_ms(), Some(2500));
    std::env::remove_var("PULSE_RECONNECT_DELAY_MS");
}

#[test]
fn test_numeric_var_invalid_is_ignored() {
    std::env::set_var("PULSE_MAX_RECONNECT_ATTEMPTS", "lots");
    assert_eq!(max_reconnect_attempts(), None);
    std::env::remove_var("PULSE_MAX_RECONNECT_ATTEMPTS");
}
