// SPDX-License-Identifier: MIT

//! Operator configuration from environment variables.
//!
//! The backend connection comes from `PDNS_API_URL`, `PDNS_API_KEY` and
//! `PDNS_API_VHOST`; the metrics server bind address from
//! `PDNS_OPERATOR_METRICS_BIND_ADDRESS`. Loading is split from the
//! environment lookup so the parsing rules stay unit-testable.

use crate::constants::{METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PORT};
use anyhow::{bail, Context as _, Result};
use url::Url;

/// Connection settings for the PowerDNS management API.
#[derive(Clone, Debug)]
pub struct PdnsConfig {
    /// Base URL of the API endpoint (e.g. `http://pdns.dns:8081`).
    pub api_url: String,

    /// API key sent as `X-API-Key`.
    pub api_key: String,

    /// Virtual host selector, `localhost` for the default server.
    pub vhost: String,
}

/// Complete operator configuration.
#[derive(Clone, Debug)]
pub struct OperatorConfig {
    /// Backend connection settings.
    pub pdns: PdnsConfig,

    /// Bind address of the metrics/health HTTP server.
    pub metrics_bind_address: String,
}

/// Load the configuration from the process environment.
///
/// # Errors
///
/// Returns an error when a required variable is missing or malformed.
pub fn load() -> Result<OperatorConfig> {
    from_lookup(|name| std::env::var(name).ok())
}

/// Build the configuration from an arbitrary variable lookup.
///
/// # Errors
///
/// Returns an error when a required variable is missing or malformed.
pub fn from_lookup<F>(lookup: F) -> Result<OperatorConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(api_url) = lookup("PDNS_API_URL").filter(|v| !v.is_empty()) else {
        bail!("PDNS_API_URL must be set to the PowerDNS API endpoint");
    };
    Url::parse(&api_url).context("PDNS_API_URL is not a valid URL")?;

    let Some(api_key) = lookup("PDNS_API_KEY").filter(|v| !v.is_empty()) else {
        bail!("PDNS_API_KEY must be set");
    };

    let vhost = lookup("PDNS_API_VHOST")
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "localhost".to_string());

    let metrics_bind_address = lookup("PDNS_OPERATOR_METRICS_BIND_ADDRESS")
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}"));

    Ok(OperatorConfig {
        pdns: PdnsConfig {
            api_url,
            api_key,
            vhost,
        },
        metrics_bind_address,
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
