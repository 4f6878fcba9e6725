// # HTTP IP Resolver
//
// This crate resolves the caller's public IPv4 address by asking an external
// IP-echo service (e.g. api.ipify.org) over HTTP.
//
// ## Contract
//
// - One GET per `resolve()` call, no caching and no retry
// - The response body is returned trimmed, without format validation
// - Any transport failure, timeout or non-2xx status is `Error::Network`
//
// The reqwest client is built once and reused by every pass.

use driftdns_core::config::IpResolverConfig;
use driftdns_core::traits::IpResolver;
use driftdns_core::{Error, Result};

use std::time::Duration;

/// Public IP resolver backed by an IP-echo HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a new HTTP IP resolver
    ///
    /// # Parameters
    ///
    /// - `url`: IP-echo URL (e.g., "https://api.ipify.org")
    /// - `timeout`: Total request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("driftdns/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from the `ip_resolver` section of the configuration
    pub fn from_config(config: &IpResolverConfig) -> Result<Self> {
        Self::new(config.url.clone(), config.timeout())
    }

    /// The configured endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip = body.trim().to_string();
        tracing::debug!(url = %self.url, ip = %ip, "resolved public IP");
        Ok(ip)
    }

    fn source_name(&self) -> &str {
        "http"
    }
}
