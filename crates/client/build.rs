// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let path = std::path::Path::new(&out_dir).join("env_vars.rs");
    let mut f = std::fs::File::create(path)?;

    let vars = [
        ("PULSE_CONFIG", "PULSE_CONFIG"),
        ("PULSE_BASE_URL", "PULSE_BASE_URL"),
        ("PULSE_TOKEN", "PULSE_TOKEN"),
        ("PULSE_STATE_DIR", "PULSE_STATE_DIR"),
        ("PULSE_MAX_RECONNECT_ATTEMPTS", "PULSE_MAX_RECONNECT_ATTEMPTS"),
        ("PULSE_RECONNECT_DELAY_MS", "PULSE_RECONNECT_DELAY_MS"),
        ("PULSE_HEARTBEAT_INTERVAL_MS", "PULSE_HEARTBEAT_INTERVAL_MS"),
        ("PULSE_CONNECTION_TIMEOUT_MS", "PULSE_CONNECTION_TIMEOUT_MS"),
        ("PULSE_MAX_MESSAGES_PER_MINUTE", "PULSE_MAX_MESSAGES_PER_MINUTE"),
        ("PULSE_RATE_LIMIT_WINDOW_MS", "PULSE_RATE_LIMIT_WINDOW_MS"),
        ("XDG_STATE_HOME", "XDG_STATE_HOME"),
    ];

    for (const_name, env_name) in &vars {
        writeln!(f, "pub const {const_name}: &str = \"{env_name}\";")?;
    }

    Ok(())
}
