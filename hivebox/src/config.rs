//! Service configuration
//!
//! Deployment settings only. Defaults can be overridden through `HIVEBOX_*`
//! environment variables; the senseBox ids are fixed and not configurable.

use crate::sensebox::OPENSENSEMAP_BASE_URL;
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const BIND_ADDR_VAR: &str = "HIVEBOX_BIND_ADDR";
pub const UPSTREAM_URL_VAR: &str = "HIVEBOX_UPSTREAM_URL";
pub const HTTP_TIMEOUT_VAR: &str = "HIVEBOX_HTTP_TIMEOUT_SECS";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Base URL of the openSenseMap boxes endpoint
    pub upstream_url: String,
    /// Timeout applied to each upstream request
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            upstream_url: OPENSENSEMAP_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("Invalid {}: {}", BIND_ADDR_VAR, addr))?;
        }

        if let Some(url) = lookup(UPSTREAM_URL_VAR) {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                anyhow::bail!("{} must not be empty", UPSTREAM_URL_VAR);
            }
            config.upstream_url = url.to_string();
        }

        if let Some(secs) = lookup(HTTP_TIMEOUT_VAR) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {}", HTTP_TIMEOUT_VAR, secs))?;
            if secs == 0 {
                anyhow::bail!("{} must be greater than zero", HTTP_TIMEOUT_VAR);
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
