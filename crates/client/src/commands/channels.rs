// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use crate::channels::Channel;
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(output: OutputFormat) -> Result<()> {
    print!("{}", format_channels(output)?);
    Ok(())
}

/// Renders the channel table.
pub fn format_channels(output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Json => {
            let channels: Vec<_> = Channel::ALL
                .iter()
                .map(|c| {
                    json!({
                        "name": c.name(),
                        "endpoint": c.endpoint_name(),
                        "filters": c.filter_keys(),
                        "events": c.event_kinds(),
                    })
                })
                .collect();
            Ok(format!("{}\n", serde_json::to_string_pretty(&channels)?))
        }
        OutputFormat::Text => {
            let width = Channel::ALL.iter().map(|c| c.name().len()).max().unwrap_or(0);
            let mut out = String::new();
            for channel in Channel::ALL {
                out.push_str(&format!(
                    "{:width$}  filters: {}\n{:width$}  events:  {}\n",
                    channel.name(),
                    channel.filter_keys().join(", "),
                    "",
                    channel.event_kinds().join(", "),
                ));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
#[path = "channels_tests.rs"]
mod tests;
