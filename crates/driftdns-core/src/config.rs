//! Configuration types for the driftdns system
//!
//! Configuration is loaded once at startup from an optional JSON settings file,
//! overridden by `DRIFTDNS_*` environment variables, and validated before the
//! scheduler starts. It is immutable afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default IP-echo endpoint
pub const DEFAULT_IP_URL: &str = "https://api.ipify.org";

/// Environment variable: access key
pub const ENV_ACCESS_KEY: &str = "DRIFTDNS_ACCESS_KEY";
/// Environment variable: secret key
pub const ENV_SECRET_KEY: &str = "DRIFTDNS_SECRET_KEY";
/// Environment variable: region
pub const ENV_REGION: &str = "DRIFTDNS_REGION";
/// Environment variable: polling interval in milliseconds
pub const ENV_INTERVAL_MS: &str = "DRIFTDNS_INTERVAL_MS";
/// Environment variable: comma-separated `ZONE=name` pairs
pub const ENV_DOMAINS: &str = "DRIFTDNS_DOMAINS";
/// Environment variable: IP-echo endpoint
pub const ENV_IP_URL: &str = "DRIFTDNS_IP_URL";
/// Environment variable: skip policy (`halt_pass` or `skip_domain`)
pub const ENV_SKIP_POLICY: &str = "DRIFTDNS_SKIP_POLICY";

/// Main driftdns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Provider credentials
    #[serde(default)]
    pub credentials: Credentials,

    /// Provider region identifier (e.g. "us-east-1")
    #[serde(default)]
    pub region: String,

    /// Polling interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Domains to reconcile, in processing order
    #[serde(default)]
    pub domains: Vec<DomainConfig>,

    /// IP resolver settings
    #[serde(default)]
    pub ip_resolver: IpResolverConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ReconcilerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            credentials: Credentials::default(),
            region: String::new(),
            interval_ms: default_interval_ms(),
            domains: Vec::new(),
            ip_resolver: IpResolverConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Parse a configuration from JSON text
    ///
    /// Accepts the native snake_case layout and the older `Settings.json`
    /// layout, which nests PascalCase keys under an `App` section.
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("App").is_some() {
            let file: AppSettingsFile = serde_json::from_value(value)?;
            return Ok(file.app.into());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Load configuration from a JSON settings file
    ///
    /// A missing file is not an error: the defaults are returned so that the
    /// environment can supply every field.
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::new());
        }

        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply `DRIFTDNS_*` overrides
    ///
    /// `lookup` resolves a variable name to its value; pass
    /// `|key| std::env::var(key).ok()` for the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ACCESS_KEY) {
            self.credentials.access_key = value;
        }
        if let Some(value) = lookup(ENV_SECRET_KEY) {
            self.credentials.secret_key = value;
        }
        if let Some(value) = lookup(ENV_REGION) {
            self.region = value;
        }
        if let Some(value) = lookup(ENV_INTERVAL_MS) {
            self.interval_ms = value.trim().parse().map_err(|_| {
                crate::Error::config(format!(
                    "{ENV_INTERVAL_MS} must be a positive integer. Got: {value}"
                ))
            })?;
        }
        if let Some(value) = lookup(ENV_DOMAINS) {
            self.domains = parse_domain_list(&value)?;
        }
        if let Some(value) = lookup(ENV_IP_URL) {
            self.ip_resolver.url = value;
        }
        if let Some(value) = lookup(ENV_SKIP_POLICY) {
            self.engine.skip_policy = value.parse()?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.credentials.validate()?;

        if self.region.trim().is_empty() {
            return Err(crate::Error::config("Region cannot be empty"));
        }

        if self.interval_ms == 0 {
            return Err(crate::Error::config("Polling interval must be > 0"));
        }

        for domain in &self.domains {
            domain.validate()?;
        }

        self.ip_resolver.validate()?;

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }

    /// Polling interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider access credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Access key id
    #[serde(default)]
    pub access_key: String,

    /// Secret access key
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub secret_key: String,
}

impl Credentials {
    /// Create credentials from an access key and a secret key
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    fn validate(&self) -> Result<(), crate::Error> {
        if self.access_key.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Access key cannot be empty. Set it via: export {ENV_ACCESS_KEY}=..."
            )));
        }
        if self.secret_key.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Secret key cannot be empty. Set it via: export {ENV_SECRET_KEY}=..."
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<REDACTED>")
            .finish()
    }
}

/// A domain whose A record is kept in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Provider hosted zone id (e.g. "Z0123456789ABC")
    pub hosted_zone_id: String,

    /// Fully-qualified record name, exactly as the provider reports it
    /// (e.g. "home.example.com.")
    pub name: String,
}

impl DomainConfig {
    /// Create a new domain configuration
    pub fn new(hosted_zone_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hosted_zone_id: hosted_zone_id.into(),
            name: name.into(),
        }
    }

    fn validate(&self) -> Result<(), crate::Error> {
        if self.hosted_zone_id.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Hosted zone id cannot be empty (domain: {})",
                self.name
            )));
        }
        if self.name.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name cannot be empty (zone: {})",
                self.hosted_zone_id
            )));
        }
        if !self.name.ends_with('.') {
            tracing::warn!(
                domain = %self.name,
                "domain name has no trailing dot and may never match a provider record name"
            );
        }
        Ok(())
    }
}

/// `Settings.json` with an `App` section
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AppSettingsFile {
    app: AppSection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AppSection {
    #[serde(default)]
    access_key: String,
    #[serde(default)]
    secret_key: String,
    #[serde(default)]
    region: String,
    /// Milliseconds
    #[serde(default = "default_interval_ms")]
    interval: u64,
    #[serde(default)]
    domains: Vec<AppDomain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AppDomain {
    #[serde(rename = "HostedZoneID")]
    hosted_zone_id: String,
    name: String,
}

impl From<AppSection> for ReconcilerConfig {
    fn from(app: AppSection) -> Self {
        Self {
            credentials: Credentials::new(app.access_key, app.secret_key),
            region: app.region,
            interval_ms: app.interval,
            domains: app
                .domains
                .into_iter()
                .map(|d| DomainConfig::new(d.hosted_zone_id, d.name))
                .collect(),
            ..Self::new()
        }
    }
}

/// Parse `ZONE=name,ZONE=name` into domain entries, keeping order
fn parse_domain_list(value: &str) -> Result<Vec<DomainConfig>, crate::Error> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (zone, name) = entry.split_once('=').ok_or_else(|| {
                crate::Error::config(format!(
                    "{ENV_DOMAINS} entries must look like ZONE=name. Got: {entry}"
                ))
            })?;
            Ok(DomainConfig::new(zone.trim(), name.trim()))
        })
        .collect()
}

/// IP resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpResolverConfig {
    /// IP-echo endpoint returning the caller's address as plain text
    #[serde(default = "default_ip_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpResolverConfig {
    fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP resolver URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "IP resolver URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP resolver timeout must be > 0"));
        }
        Ok(())
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for IpResolverConfig {
    fn default() -> Self {
        Self {
            url: default_ip_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// What a pass does after a domain needs no update (record missing,
/// record without values, or value already current)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Stop the whole pass at the first such domain
    #[default]
    HaltPass,
    /// Skip only that domain and continue with the next one
    SkipDomain,
}

impl FromStr for SkipPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "halt_pass" => Ok(Self::HaltPass),
            "skip_domain" => Ok(Self::SkipDomain),
            other => Err(crate::Error::config(format!(
                "Skip policy '{other}' is not valid. Valid policies: halt_pass, skip_domain"
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay before the first pass (in milliseconds)
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Behavior after a domain that needs no update
    #[serde(default)]
    pub skip_policy: SkipPolicy,

    /// Capacity of the reconcile event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Startup delay as a duration
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            skip_policy: SkipPolicy::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_ms() -> u64 {
    300_000
}

fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_startup_delay_ms() -> u64 {
    1_000
}

fn default_event_channel_capacity() -> usize {
    100
}
