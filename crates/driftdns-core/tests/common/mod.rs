//! Test doubles and common utilities for reconciler contract tests
//!
//! This module provides minimal test doubles that record every call so the
//! contract tests can assert exactly which provider operations a pass issued.

#![allow(dead_code)]

use driftdns_core::config::{Credentials, DomainConfig, ReconcilerConfig, SkipPolicy};
use driftdns_core::error::{Error, ProviderErrorKind, Result};
use driftdns_core::traits::{DnsProvider, IpResolver, ResourceRecordSet};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An IpResolver that replays scripted results, then repeats a fallback IP
pub struct ScriptedIpResolver {
    /// Results returned before falling back
    script: Arc<Mutex<VecDeque<Result<String>>>>,
    /// Returned once the script is exhausted
    fallback_ip: String,
    /// Call counter for resolve()
    resolve_call_count: Arc<AtomicUsize>,
}

impl ScriptedIpResolver {
    /// Always resolve to `ip`
    pub fn new(ip: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback_ip: ip.to_string(),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the next call with a network error, then resolve to `ip`
    pub fn failing_once_then(ip: &str) -> Self {
        let resolver = Self::new(ip);
        resolver
            .script
            .lock()
            .unwrap()
            .push_back(Err(Error::network("connection refused")));
        resolver
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }

    /// Create a new resolver that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            fallback_ip: other.fallback_ip.clone(),
            resolve_call_count: Arc::clone(&other.resolve_call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedIpResolver {
    async fn resolve(&self) -> Result<String> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.fallback_ip.clone()),
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

/// An in-memory DnsProvider with upsert semantics that tracks calls
pub struct InMemoryProvider {
    /// Record sets per hosted zone
    zones: Arc<Mutex<HashMap<String, Vec<ResourceRecordSet>>>>,
    /// Zone ids passed to list_records(), in call order
    list_calls: Arc<Mutex<Vec<String>>>,
    /// (zone id, record) pairs passed to upsert_record(), in call order
    upserts: Arc<Mutex<Vec<(String, ResourceRecordSet)>>>,
    /// Zones whose listing fails
    failing_zones: Arc<Mutex<HashSet<String>>>,
    /// Panic on the next list_records() call
    panic_next_list: Arc<AtomicBool>,
    /// Artificial latency for list_records()
    list_delay: Option<Duration>,
    /// Concurrent list_records() calls in flight
    active_lists: Arc<AtomicUsize>,
    /// Highest observed value of `active_lists`
    max_active_lists: Arc<AtomicUsize>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(Mutex::new(HashMap::new())),
            list_calls: Arc::new(Mutex::new(Vec::new())),
            upserts: Arc::new(Mutex::new(Vec::new())),
            failing_zones: Arc::new(Mutex::new(HashSet::new())),
            panic_next_list: Arc::new(AtomicBool::new(false)),
            list_delay: None,
            active_lists: Arc::new(AtomicUsize::new(0)),
            max_active_lists: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add artificial latency to every listing
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Seed a record set into a zone
    pub fn insert(&self, zone_id: &str, record: ResourceRecordSet) {
        self.zones
            .lock()
            .unwrap()
            .entry(zone_id.to_string())
            .or_default()
            .push(record);
    }

    /// Make listings of `zone_id` fail with a provider error
    pub fn fail_zone(&self, zone_id: &str) {
        self.failing_zones
            .lock()
            .unwrap()
            .insert(zone_id.to_string());
    }

    /// Panic inside the next list_records() call
    pub fn panic_on_next_list(&self) {
        self.panic_next_list.store(true, Ordering::SeqCst);
    }

    /// Current record sets of a zone
    pub fn records(&self, zone_id: &str) -> Vec<ResourceRecordSet> {
        self.zones
            .lock()
            .unwrap()
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Zone ids passed to list_records(), in call order
    pub fn list_calls(&self) -> Vec<String> {
        self.list_calls.lock().unwrap().clone()
    }

    /// Records passed to upsert_record(), in call order
    pub fn upserts(&self) -> Vec<(String, ResourceRecordSet)> {
        self.upserts.lock().unwrap().clone()
    }

    /// Get the number of times upsert_record() was called
    pub fn upsert_call_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    /// Highest number of list_records() calls observed in flight at once
    pub fn max_concurrent_lists(&self) -> usize {
        self.max_active_lists.load(Ordering::SeqCst)
    }

    /// Create a new InMemoryProvider that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            list_calls: Arc::clone(&other.list_calls),
            upserts: Arc::clone(&other.upserts),
            failing_zones: Arc::clone(&other.failing_zones),
            panic_next_list: Arc::clone(&other.panic_next_list),
            list_delay: other.list_delay,
            active_lists: Arc::clone(&other.active_lists),
            max_active_lists: Arc::clone(&other.max_active_lists),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for InMemoryProvider {
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ResourceRecordSet>> {
        if self.panic_next_list.swap(false, Ordering::SeqCst) {
            panic!("provider blew up while listing {zone_id}");
        }

        self.list_calls.lock().unwrap().push(zone_id.to_string());

        let active = self.active_lists.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_lists.fetch_max(active, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.active_lists.fetch_sub(1, Ordering::SeqCst);

        if self.failing_zones.lock().unwrap().contains(zone_id) {
            return Err(Error::provider(
                "in-memory",
                ProviderErrorKind::RateLimited,
                "Throttling: Rate exceeded",
            ));
        }

        Ok(self.records(zone_id))
    }

    async fn upsert_record(&self, zone_id: &str, record: &ResourceRecordSet) -> Result<()> {
        self.upserts
            .lock()
            .unwrap()
            .push((zone_id.to_string(), record.clone()));

        let mut zones = self.zones.lock().unwrap();
        let records = zones.entry(zone_id.to_string()).or_default();
        match records
            .iter_mut()
            .find(|r| r.name == record.name && r.record_type == record.record_type)
        {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "in-memory"
    }
}

/// An A record set with a single value and a 300s TTL
pub fn a_record(name: &str, ip: &str) -> ResourceRecordSet {
    ResourceRecordSet::a(name, 300, ip)
}

/// An A record set without values (as an alias record looks)
pub fn valueless_record(name: &str) -> ResourceRecordSet {
    let mut record = ResourceRecordSet::a(name, 300, "");
    record.ttl = None;
    record.values.clear();
    record
}

/// Helper to create a minimal ReconcilerConfig for testing
pub fn minimal_config(domains: &[(&str, &str)]) -> ReconcilerConfig {
    let mut config = ReconcilerConfig::new();
    config.credentials = Credentials::new("AKIDEXAMPLE", "test-secret");
    config.region = "us-east-1".to_string();
    config.interval_ms = 1_000;
    config.engine.startup_delay_ms = 0;
    config.domains = domains
        .iter()
        .map(|(zone, name)| DomainConfig::new(*zone, *name))
        .collect();
    config
}

/// Same as [`minimal_config`], with a skip policy
pub fn config_with_policy(domains: &[(&str, &str)], policy: SkipPolicy) -> ReconcilerConfig {
    let mut config = minimal_config(domains);
    config.engine.skip_policy = policy;
    config
}
