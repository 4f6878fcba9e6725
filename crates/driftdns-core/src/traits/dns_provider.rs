// # DNS Provider Trait
//
// Defines the two provider operations the reconciler consumes: listing the
// record sets of a hosted zone and upserting one record set.
//
// ## Implementations
//
// - Amazon Route 53: `driftdns-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use driftdns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let mut records = provider.list_records("Z0123456789ABC").await?;
//     if let Some(record) = records.iter_mut().find(|r| r.name == "home.example.com.") {
//         record.values = vec!["203.0.113.7".to_string()];
//         provider.upsert_record("Z0123456789ABC", record).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// DNS record type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name record
    Cname,
    /// Mail exchange record
    Mx,
    /// Name server record
    Ns,
    /// Start of authority record
    Soa,
    /// Text record
    Txt,
    /// Any other type, kept verbatim
    Other(String),
}

impl RecordType {
    /// Wire representation (e.g. "A", "AAAA")
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Soa => "SOA",
            Self::Txt => "TXT",
            Self::Other(other) => other,
        }
    }
}

impl FromStr for RecordType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "A" => Self::A,
            "AAAA" => Self::Aaaa,
            "CNAME" => Self::Cname,
            "MX" => Self::Mx,
            "NS" => Self::Ns,
            "SOA" => Self::Soa,
            "TXT" => Self::Txt,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geolocation routing target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub continent_code: Option<String>,
    pub country_code: Option<String>,
    pub subdivision_code: Option<String>,
}

/// CIDR routing target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrRouting {
    pub collection_id: String,
    pub location_name: String,
}

/// Routing attributes of a record set
///
/// The reconciler never edits these. Providers write them back exactly as
/// they were listed, so an upsert keeps a weighted, latency, failover,
/// geolocation or multivalue record on its routing policy. A simple record
/// has every field unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingPolicy {
    /// Distinguishes record sets sharing a name and type
    pub set_identifier: Option<String>,
    pub weight: Option<u64>,
    /// Latency routing region
    pub region: Option<String>,
    pub geo_location: Option<GeoLocation>,
    /// "PRIMARY" or "SECONDARY"
    pub failover: Option<String>,
    pub multi_value_answer: Option<bool>,
    pub health_check_id: Option<String>,
    pub cidr_routing: Option<CidrRouting>,
}

impl RoutingPolicy {
    /// True when no routing attribute is set
    pub fn is_simple(&self) -> bool {
        *self == Self::default()
    }
}

/// A provider-side record set
///
/// Fetched fresh for each domain in each pass and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecordSet {
    /// Fully-qualified name as the provider reports it
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Time-to-live in seconds (absent for alias records)
    pub ttl: Option<u64>,
    /// Record values; an A record usually carries exactly one address
    pub values: Vec<String>,
    /// Routing attributes, resubmitted unchanged on upsert
    pub routing: RoutingPolicy,
}

impl ResourceRecordSet {
    /// Create an A record set with a single value
    pub fn a(name: impl Into<String>, ttl: u64, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::A,
            ttl: Some(ttl),
            values: vec![value.into()],
            routing: RoutingPolicy::default(),
        }
    }

    /// First value, if any
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - Errors are returned, never retried; the scheduler's next tick is the
///   retry.
/// - `list_records` handles pagination internally and returns every record
///   set of the zone.
/// - `upsert_record` creates the record set if absent and replaces it if
///   present, so repeating it with the same input is harmless.
/// - Providers do not decide whether an update is needed; that belongs to the
///   reconciler.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List all record sets in a hosted zone
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ResourceRecordSet>)`: Every record set of the zone
    /// - `Err(Error::Provider)`: Auth, rate limit, missing zone, network
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ResourceRecordSet>, crate::Error>;

    /// Upsert a record set in a hosted zone
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the change
    /// - `Err(Error::Provider)`: The provider rejected the change
    async fn upsert_record(
        &self,
        zone_id: &str,
        record: &ResourceRecordSet,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
