// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint names and transport address construction.
//!
//! Address format: `<base>/<name>?token=<token>&<param>=<value>...`, with
//! the token first when present and parameters URL-encoded in insertion
//! order.

use std::fmt;

use url::form_urlencoded;

use pulse_core::{Error, Result};

/// A server endpoint plus its channel-specific query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    name: String,
    params: Vec<(String, String)>,
}

impl Endpoint {
    /// Creates an endpoint without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Endpoint {
            name: name.into().trim_matches('/').to_string(),
            params: Vec::new(),
        }
    }

    /// Adds a query parameter.
    pub fn param(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds a query parameter when a value is present.
    pub fn param_opt<V: fmt::Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns `name` or `name?k=v&...`.
    pub fn path_and_query(&self) -> String {
        if self.params.is_empty() {
            return self.name.clone();
        }
        format!("{}?{}", self.name, encode(None, &self.params))
    }

    /// Builds the full transport address.
    pub fn to_url(&self, base: &str, token: Option<&str>) -> Result<String> {
        self.validate()?;
        let mut address = format!("{}/{}", base.trim_end_matches('/'), self.name);
        let token = token.filter(|t| !t.is_empty());
        if token.is_some() || !self.params.is_empty() {
            address.push('?');
            address.push_str(&encode(token, &self.params));
        }
        url::Url::parse(&address).map_err(|e| Error::InvalidEndpoint(format!("{address}: {e}")))?;
        Ok(address)
    }

    fn validate(&self) -> Result<()> {
        let bad = self.name.is_empty()
            || self
                .name
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '?' | '#' | '&'))
            || self.name.split('/').any(str::is_empty);
        if bad {
            return Err(Error::InvalidEndpoint(self.name.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_and_query())
    }
}

fn encode(token: Option<&str>, params: &[(String, String)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(token) = token {
        query.append_pair("token", token);
    }
    for (key, value) in params {
        query.append_pair(key, value);
    }
    query.finish()
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
