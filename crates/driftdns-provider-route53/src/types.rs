//! Route 53 XML wire types (API version 2013-04-01)

use driftdns_core::traits::{CidrRouting, GeoLocation, ResourceRecordSet, RoutingPolicy};
use serde::{Deserialize, Serialize};

pub(crate) const ROUTE53_XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

// ============ ListResourceRecordSets ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListResourceRecordSetsResponse {
    #[serde(default)]
    pub resource_record_sets: ResourceRecordSets,
    pub is_truncated: bool,
    pub next_record_name: Option<String>,
    pub next_record_type: Option<String>,
    pub next_record_identifier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResourceRecordSets {
    #[serde(rename = "ResourceRecordSet", default)]
    pub items: Vec<WireRecordSet>,
}

/// A ResourceRecordSet element
///
/// Field order follows the Route 53 schema, which the serializer preserves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireRecordSet {
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_location: Option<WireGeoLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_value_answer: Option<bool>,
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_records: Option<ResourceRecords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_routing_config: Option<WireCidrRoutingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ResourceRecords {
    #[serde(rename = "ResourceRecord", default)]
    pub items: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResourceRecord {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireGeoLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireCidrRoutingConfig {
    pub collection_id: String,
    pub location_name: String,
}

impl From<WireRecordSet> for ResourceRecordSet {
    fn from(wire: WireRecordSet) -> Self {
        let values = wire
            .resource_records
            .map(|records| records.items.into_iter().map(|r| r.value).collect())
            .unwrap_or_default();

        let routing = RoutingPolicy {
            set_identifier: wire.set_identifier,
            weight: wire.weight,
            region: wire.region,
            geo_location: wire.geo_location.map(|geo| GeoLocation {
                continent_code: geo.continent_code,
                country_code: geo.country_code,
                subdivision_code: geo.subdivision_code,
            }),
            failover: wire.failover,
            multi_value_answer: wire.multi_value_answer,
            health_check_id: wire.health_check_id,
            cidr_routing: wire.cidr_routing_config.map(|cidr| CidrRouting {
                collection_id: cidr.collection_id,
                location_name: cidr.location_name,
            }),
        };

        Self {
            name: wire.name,
            // FromStr for RecordType is infallible
            record_type: wire
                .record_type
                .parse()
                .unwrap_or_else(|never| match never {}),
            ttl: wire.ttl,
            values,
            routing,
        }
    }
}

impl From<&ResourceRecordSet> for WireRecordSet {
    fn from(record: &ResourceRecordSet) -> Self {
        let resource_records = (!record.values.is_empty()).then(|| ResourceRecords {
            items: record
                .values
                .iter()
                .map(|value| ResourceRecord {
                    value: value.clone(),
                })
                .collect(),
        });
        let routing = &record.routing;

        Self {
            name: record.name.clone(),
            record_type: record.record_type.as_str().to_string(),
            set_identifier: routing.set_identifier.clone(),
            weight: routing.weight,
            region: routing.region.clone(),
            geo_location: routing.geo_location.as_ref().map(|geo| WireGeoLocation {
                continent_code: geo.continent_code.clone(),
                country_code: geo.country_code.clone(),
                subdivision_code: geo.subdivision_code.clone(),
            }),
            failover: routing.failover.clone(),
            multi_value_answer: routing.multi_value_answer,
            ttl: record.ttl,
            resource_records,
            health_check_id: routing.health_check_id.clone(),
            cidr_routing_config: routing.cidr_routing.as_ref().map(|cidr| WireCidrRoutingConfig {
                collection_id: cidr.collection_id.clone(),
                location_name: cidr.location_name.clone(),
            }),
        }
    }
}

// ============ ChangeResourceRecordSets ============

#[derive(Debug, Serialize)]
#[serde(rename = "ChangeResourceRecordSetsRequest", rename_all = "PascalCase")]
pub(crate) struct ChangeResourceRecordSetsRequest {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    pub change_batch: ChangeBatch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChangeBatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub changes: Changes,
}

#[derive(Debug, Serialize)]
pub(crate) struct Changes {
    #[serde(rename = "Change")]
    pub items: Vec<Change>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Change {
    pub action: &'static str,
    pub resource_record_set: WireRecordSet,
}

impl ChangeResourceRecordSetsRequest {
    /// A batch holding a single UPSERT of `record`
    pub(crate) fn upsert(record: &ResourceRecordSet) -> Self {
        Self {
            xmlns: ROUTE53_XMLNS,
            change_batch: ChangeBatch {
                comment: Some(format!("driftdns update of {}", record.name)),
                changes: Changes {
                    items: vec![Change {
                        action: "UPSERT",
                        resource_record_set: WireRecordSet::from(record),
                    }],
                },
            },
        }
    }

    pub(crate) fn to_xml(&self) -> Result<String, String> {
        let body = quick_xml::se::to_string(self).map_err(|e| e.to_string())?;
        Ok(format!("{XML_DECLARATION}{body}"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChangeResourceRecordSetsResponse {
    pub change_info: ChangeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChangeInfo {
    pub id: String,
    pub status: String,
}

// ============ Errors ============

/// `<ErrorResponse><Error>...</Error></ErrorResponse>`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// `<InvalidChangeBatch><Messages><Message>...</Message></Messages></InvalidChangeBatch>`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct InvalidChangeBatch {
    pub messages: Messages,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Messages {
    #[serde(rename = "Message", default)]
    pub items: Vec<String>,
}

/// Error code and message extracted from a failed response body
pub(crate) fn parse_error_body(body: &str) -> Option<(String, String)> {
    if let Ok(response) = quick_xml::de::from_str::<ErrorResponse>(body) {
        return Some((response.error.code, response.error.message));
    }
    if let Ok(batch) = quick_xml::de::from_str::<InvalidChangeBatch>(body) {
        return Some(("InvalidChangeBatch".to_string(), batch.messages.items.join("; ")));
    }
    None
}
