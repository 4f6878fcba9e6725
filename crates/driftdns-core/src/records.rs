//! Record lookup and record update
//!
//! Thin wrappers over [`DnsProvider`] that implement the selection policy for
//! a (zone, name) pair and log provider failures before propagating them.

use crate::error::{Error, Result};
use crate::traits::{DnsProvider, RecordType, ResourceRecordSet};
use tracing::{debug, error};

/// Find the A record set named `name` in `zone_id`
///
/// # Returns
///
/// - `Ok(Some(record))`: Exactly one A record set with that name
/// - `Ok(None)`: No such record set
/// - `Err(Error::AmbiguousRecord)`: More than one matching record set
/// - `Err(Error::Provider)`: The listing failed
pub async fn lookup_record(
    provider: &dyn DnsProvider,
    zone_id: &str,
    name: &str,
) -> Result<Option<ResourceRecordSet>> {
    let records = provider.list_records(zone_id).await.inspect_err(|e| {
        error!(zone_id, domain = name, error = %e, "record lookup failed");
    })?;

    debug!(zone_id, count = records.len(), "listed record sets");

    let mut matches = records
        .into_iter()
        .filter(|record| record.name == name && record.record_type == RecordType::A);

    let Some(found) = matches.next() else {
        return Ok(None);
    };

    let extra = matches.count();
    if extra > 0 {
        return Err(Error::AmbiguousRecord {
            zone_id: zone_id.to_string(),
            name: name.to_string(),
            matches: extra + 1,
        });
    }

    Ok(Some(found))
}

/// Submit `record` as an upsert against `zone_id`
pub async fn upsert_record(
    provider: &dyn DnsProvider,
    zone_id: &str,
    record: &ResourceRecordSet,
) -> Result<()> {
    provider.upsert_record(zone_id, record).await.inspect_err(|e| {
        error!(zone_id, domain = %record.name, error = %e, "record upsert failed");
    })
}
