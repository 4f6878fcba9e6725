// # driftdns-core
//
// Core library for the driftdns A-record reconciler.
//
// ## Architecture Overview
//
// This library provides the reconciliation loop that keeps a set of DNS A
// records pointed at the caller's current public IPv4 address:
// - **IpResolver**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for listing and upserting DNS record sets
// - **records**: Record lookup (exact name + type match) and record update
// - **Reconciler**: One reconciliation pass with change detection and skip policy
// - **Scheduler**: Fixed-interval driver with pass isolation and cooperative shutdown
//
// ## Design Principles
//
// 1. **Stateless passes**: The provider's current record is the source of truth
//    every pass; no last-known IP is cached
// 2. **One IP per pass**: All domains in a pass are compared against one value
// 3. **Conditional writes**: An upsert is issued only when the value differs
// 4. **Pass isolation**: A failing pass never stops the scheduler
// 5. **Library-First**: The daemon is a thin layer over this crate

pub mod traits;
pub mod engine;
pub mod scheduler;
pub mod records;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpResolver, DnsProvider, RecordType, ResourceRecordSet, RoutingPolicy};
pub use engine::{Reconciler, ReconcileEvent, SkipReason};
pub use scheduler::{PassStatus, Scheduler};
pub use config::{Credentials, DomainConfig, ReconcilerConfig, SkipPolicy};
pub use error::{Error, ProviderErrorKind, Result};
