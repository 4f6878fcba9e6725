//! Reconciliation engine
//!
//! The [`Reconciler`] runs one reconciliation pass at a time:
//! - Resolves the public IP once via [`IpResolver`]
//! - Looks up each configured domain's A record via [`DnsProvider`]
//! - Upserts the record when its value differs from the resolved IP
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────┐
//!                │  Scheduler   │  (fixed interval, pass isolation)
//!                └──────────────┘
//!                        │ reconcile_once()
//!                        ▼
//!                ┌──────────────┐
//!                │  Reconciler  │
//!                └──────────────┘
//!                        │
//!         ┌──────────────┼───────────────────────────┐
//!         │              │                           │
//!         ▼              ▼                           ▼
//! ┌─────────────┐ ┌──────────────┐          ┌─────────────┐
//! │ IpResolver  │ │ DnsProvider  │          │   Events    │
//! │ (once/pass) │ │ (list/upsert)│          │  (notify)   │
//! └─────────────┘ └──────────────┘          └─────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Resolve the public IP; on failure the pass aborts before touching any domain
//! 2. For each domain, in order: look up the record
//! 3. Missing record, record without values, or value already current:
//!    halt the pass (or skip the domain, per [`SkipPolicy`])
//! 4. Otherwise substitute the IP and upsert, then continue
//!
//! No state survives a pass. The provider's records are the source of truth
//! every time.

use crate::config::{DomainConfig, ReconcilerConfig, SkipPolicy};
use crate::error::Result;
use crate::records::{lookup_record, upsert_record};
use crate::traits::{DnsProvider, IpResolver};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Why a domain did not need an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No A record with that name exists in the zone
    RecordMissing,
    /// The record exists but carries no values (e.g. an alias record)
    NoValues,
    /// The record's first value already equals the resolved IP
    Unchanged,
}

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// A pass started
    PassStarted {
        started_at: DateTime<Utc>,
        domains_count: usize,
    },

    /// The public IP for this pass was resolved
    IpResolved { ip: String },

    /// A domain has no usable record
    RecordMissing {
        domain: String,
        reason: SkipReason,
    },

    /// A domain already points at the resolved IP
    RecordUnchanged { domain: String, current_ip: String },

    /// A domain's record was upserted
    RecordUpdated {
        domain: String,
        previous_ip: String,
        new_ip: String,
    },

    /// The pass stopped early at a domain that needed no update
    PassHalted { domain: String, reason: SkipReason },

    /// The pass finished without error
    PassCompleted { updated: usize },

    /// The pass aborted with an error
    PassFailed { error: String },
}

/// What happened to a single domain within a pass
#[derive(Debug, Clone, PartialEq, Eq)]
enum DomainOutcome {
    Updated,
    Skipped(SkipReason),
}

/// Core reconciliation engine
///
/// The reconciler owns the long-lived IP resolver and provider clients; they
/// are built once at startup and reused by every pass.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::reconcile_once()`] per tick, usually from a
///    [`Scheduler`](crate::Scheduler)
///
/// ## Threading
///
/// Domains within a pass are processed sequentially and in declared order.
/// The reconciler itself holds no mutable state and can be shared behind an
/// `Arc`.
pub struct Reconciler {
    /// Public IP resolver
    ip_resolver: Box<dyn IpResolver>,

    /// DNS provider for listing and upserting records
    provider: Box<dyn DnsProvider>,

    /// Domains to reconcile, in processing order
    domains: Vec<DomainConfig>,

    /// Behavior after a domain that needs no update
    skip_policy: SkipPolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `ip_resolver`: IP resolver implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: driftdns configuration
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// reconcile events. Dropping the receiver is allowed.
    pub fn new(
        ip_resolver: Box<dyn IpResolver>,
        provider: Box<dyn DnsProvider>,
        config: &ReconcilerConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let reconciler = Self {
            ip_resolver,
            provider,
            domains: config.domains.clone(),
            skip_policy: config.engine.skip_policy,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Domains this reconciler manages, in processing order
    pub fn domains(&self) -> &[DomainConfig] {
        &self.domains
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The pass finished or halted early by policy
    /// - `Err(Error)`: IP resolution, lookup, or upsert failed; the rest of the
    ///   pass was discarded and earlier upserts remain in effect
    pub async fn reconcile_once(&self) -> Result<()> {
        info!(domains = self.domains.len(), "reconciliation pass started");
        self.emit_event(ReconcileEvent::PassStarted {
            started_at: Utc::now(),
            domains_count: self.domains.len(),
        });

        if self.domains.is_empty() {
            debug!("no domains configured, nothing to reconcile");
            self.emit_event(ReconcileEvent::PassCompleted { updated: 0 });
            return Ok(());
        }

        match self.run_pass().await {
            Ok(updated) => {
                self.emit_event(ReconcileEvent::PassCompleted { updated });
                Ok(())
            }
            Err(e) => {
                self.emit_event(ReconcileEvent::PassFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Resolve the IP and walk the domains; returns the number of upserts
    async fn run_pass(&self) -> Result<usize> {
        let ip = self.ip_resolver.resolve().await.inspect_err(|e| {
            error!(resolver = self.ip_resolver.source_name(), error = %e, "public IP resolution failed");
        })?;
        debug!("resolved public IP {}", ip);
        self.emit_event(ReconcileEvent::IpResolved { ip: ip.clone() });

        let mut updated = 0;
        for domain in &self.domains {
            match self.reconcile_domain(domain, &ip).await? {
                DomainOutcome::Updated => updated += 1,
                DomainOutcome::Skipped(reason) => match self.skip_policy {
                    SkipPolicy::HaltPass => {
                        debug!("halting pass at {} ({:?})", domain.name, reason);
                        self.emit_event(ReconcileEvent::PassHalted {
                            domain: domain.name.clone(),
                            reason,
                        });
                        break;
                    }
                    SkipPolicy::SkipDomain => continue,
                },
            }
        }

        Ok(updated)
    }

    /// Compare one domain against `ip` and upsert when it differs
    async fn reconcile_domain(&self, domain: &DomainConfig, ip: &str) -> Result<DomainOutcome> {
        let record =
            lookup_record(self.provider.as_ref(), &domain.hosted_zone_id, &domain.name).await?;

        let Some(mut record) = record else {
            warn!(domain = %domain.name, zone_id = %domain.hosted_zone_id, "no A record found");
            self.emit_event(ReconcileEvent::RecordMissing {
                domain: domain.name.clone(),
                reason: SkipReason::RecordMissing,
            });
            return Ok(DomainOutcome::Skipped(SkipReason::RecordMissing));
        };

        let Some(current) = record.first_value().map(str::to_string) else {
            warn!(domain = %domain.name, "A record has no values");
            self.emit_event(ReconcileEvent::RecordMissing {
                domain: domain.name.clone(),
                reason: SkipReason::NoValues,
            });
            return Ok(DomainOutcome::Skipped(SkipReason::NoValues));
        };

        if current == ip {
            debug!("record {} already points at {}", domain.name, ip);
            self.emit_event(ReconcileEvent::RecordUnchanged {
                domain: domain.name.clone(),
                current_ip: current,
            });
            return Ok(DomainOutcome::Skipped(SkipReason::Unchanged));
        }

        record.values[0] = ip.to_string();
        upsert_record(self.provider.as_ref(), &domain.hosted_zone_id, &record).await?;

        info!("Updated {} -> {} (previous: {})", domain.name, ip, current);
        self.emit_event(ReconcileEvent::RecordUpdated {
            domain: domain.name.clone(),
            previous_ip: current,
            new_ip: ip.to_string(),
        });

        Ok(DomainOutcome::Updated)
    }

    /// Emit a reconcile event without blocking the pass
    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
        }
    }
}
