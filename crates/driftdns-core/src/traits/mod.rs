//! Core traits for the driftdns system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpResolver`]: Discover the current public IP
//! - [`DnsProvider`]: List and upsert DNS record sets via provider APIs

pub mod ip_resolver;
pub mod dns_provider;

pub use ip_resolver::IpResolver;
pub use dns_provider::{CidrRouting, DnsProvider, GeoLocation, RecordType, ResourceRecordSet, RoutingPolicy};
