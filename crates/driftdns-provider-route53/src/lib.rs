// # Route 53 DNS Provider
//
// This crate provides the Amazon Route 53 implementation of `DnsProvider`
// for driftdns.
//
// ## Scope
//
// - `list_records`: ListResourceRecordSets, following pagination until the
//   zone is exhausted
// - `upsert_record`: ChangeResourceRecordSets with a single UPSERT change
// - No retry, no caching: every call is one logical request and failures are
//   returned to the reconciler unchanged
//
// ## Security
//
// - The secret key NEVER appears in logs or `Debug` output
// - Requests are signed with AWS Signature Version 4
//
// ## API Reference
//
// - List: GET `/2013-04-01/hostedzone/{Id}/rrset?name=&type=&identifier=`
// - Change: POST `/2013-04-01/hostedzone/{Id}/rrset/`

mod http;
mod sign;
mod types;

use async_trait::async_trait;
use driftdns_core::config::Credentials;
use driftdns_core::traits::{DnsProvider, ResourceRecordSet};
use driftdns_core::{Error, ProviderErrorKind, Result};
use reqwest::{Method, Url};
use std::time::Duration;

use sign::Signer;
use types::{ChangeResourceRecordSetsRequest, ChangeResourceRecordSetsResponse, ListResourceRecordSetsResponse};

pub(crate) const PROVIDER_NAME: &str = "route53";

const API_VERSION: &str = "2013-04-01";

const SIGNING_SERVICE: &str = "route53";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Route 53 is a global service; each AWS partition has one endpoint and one
/// signing region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// API host
    pub endpoint: &'static str,
    /// Region used in the SigV4 credential scope
    pub signing_region: &'static str,
}

impl Partition {
    /// Partition serving `region`
    pub fn for_region(region: &str) -> Self {
        if region.starts_with("cn-") {
            Self {
                endpoint: "route53.amazonaws.com.cn",
                signing_region: "cn-northwest-1",
            }
        } else if region.starts_with("us-gov-") {
            Self {
                endpoint: "route53.us-gov.amazonaws.com",
                signing_region: "us-gov-west-1",
            }
        } else {
            Self {
                endpoint: "route53.amazonaws.com",
                signing_region: "us-east-1",
            }
        }
    }
}

/// Strip the `/hostedzone/` prefix the console and some APIs include
pub fn normalize_zone_id(zone_id: &str) -> &str {
    zone_id
        .trim_start_matches('/')
        .trim_start_matches("hostedzone/")
}

/// Pagination cursor for ListResourceRecordSets
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageCursor {
    name: String,
    record_type: Option<String>,
    identifier: Option<String>,
}

impl PageCursor {
    fn from_page(page: &ListResourceRecordSetsResponse) -> Option<Self> {
        Some(Self {
            name: page.next_record_name.clone()?,
            record_type: page.next_record_type.clone(),
            identifier: page.next_record_identifier.clone(),
        })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("name", self.name.clone())];
        if let Some(record_type) = &self.record_type {
            query.push(("type", record_type.clone()));
        }
        if let Some(identifier) = &self.identifier {
            query.push(("identifier", identifier.clone()));
        }
        query
    }
}

/// Amazon Route 53 DNS provider
///
/// The reqwest client is built once and reused for every call. The Debug
/// implementation does NOT expose the secret key.
#[derive(Debug)]
pub struct Route53Provider {
    /// SigV4 identity
    signer: Signer,

    /// Scheme, host and optional port of the API
    endpoint: Url,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl Route53Provider {
    /// Create a provider for the partition that serves `region`
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the credentials are empty or the HTTP client
    ///   cannot be built
    pub fn new(credentials: &Credentials, region: &str) -> Result<Self> {
        let partition = Partition::for_region(region);
        Self::with_endpoint(
            credentials,
            partition.signing_region,
            &format!("https://{}", partition.endpoint),
        )
    }

    /// Create a provider against an explicit endpoint (e.g., a local mock)
    pub fn with_endpoint(
        credentials: &Credentials,
        signing_region: &str,
        endpoint: &str,
    ) -> Result<Self> {
        if credentials.access_key.is_empty() || credentials.secret_key.is_empty() {
            return Err(Error::config("Route 53 credentials cannot be empty"));
        }

        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("Invalid Route 53 endpoint '{}': {}", endpoint, e)))?;
        if endpoint.host_str().is_none() {
            return Err(Error::config(format!(
                "Route 53 endpoint has no host: {}",
                endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(concat!("driftdns/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            signer: Signer::new(
                credentials.access_key.clone(),
                credentials.secret_key.clone(),
                signing_region,
                SIGNING_SERVICE,
            ),
            endpoint,
            client,
        })
    }

    /// Region used in the request signature
    pub fn signing_region(&self) -> &str {
        self.signer.region()
    }

    /// `scheme://host[:port]` without a trailing slash
    pub(crate) fn base_url(&self) -> String {
        self.endpoint.as_str().trim_end_matches('/').to_string()
    }

    /// Value of the `host` header as reqwest will send it
    pub(crate) fn host_header(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    fn rrset_path(zone_id: &str) -> String {
        format!(
            "/{API_VERSION}/hostedzone/{}/rrset",
            normalize_zone_id(zone_id)
        )
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ResourceRecordSet>> {
        let path = Self::rrset_path(zone_id);
        let mut records = Vec::new();
        let mut cursor: Option<PageCursor> = None;

        loop {
            let query = cursor.as_ref().map(PageCursor::query).unwrap_or_default();
            let body = self.send_signed(Method::GET, &path, &query, None).await?;

            let page: ListResourceRecordSetsResponse =
                quick_xml::de::from_str(&body).map_err(|e| {
                    Error::provider(
                        PROVIDER_NAME,
                        ProviderErrorKind::Other,
                        format!("Malformed ListResourceRecordSets response: {}", e),
                    )
                })?;

            let truncated = page.is_truncated;
            let next = PageCursor::from_page(&page);
            records.extend(page.resource_record_sets.items.into_iter().map(Into::into));

            if !truncated {
                break;
            }

            let Some(next) = next else {
                return Err(Error::provider(
                    PROVIDER_NAME,
                    ProviderErrorKind::Other,
                    "Truncated ListResourceRecordSets response without NextRecordName",
                ));
            };

            if cursor.as_ref() == Some(&next) {
                return Err(Error::provider(
                    PROVIDER_NAME,
                    ProviderErrorKind::Other,
                    format!("Pagination did not advance past {}", next.name),
                ));
            }

            tracing::debug!(zone_id, next = %next.name, "fetching next record page");
            cursor = Some(next);
        }

        tracing::debug!(zone_id, count = records.len(), "listed Route 53 record sets");
        Ok(records)
    }

    async fn upsert_record(&self, zone_id: &str, record: &ResourceRecordSet) -> Result<()> {
        let payload = ChangeResourceRecordSetsRequest::upsert(record)
            .to_xml()
            .map_err(|e| {
                Error::provider(
                    PROVIDER_NAME,
                    ProviderErrorKind::InvalidRequest,
                    format!("Failed to serialize change batch: {}", e),
                )
            })?;

        let path = format!("{}/", Self::rrset_path(zone_id));
        let body = self
            .send_signed(Method::POST, &path, &[], Some(payload))
            .await?;

        match quick_xml::de::from_str::<ChangeResourceRecordSetsResponse>(&body) {
            Ok(response) => tracing::info!(
                zone_id,
                domain = %record.name,
                change_id = %response.change_info.id,
                status = %response.change_info.status,
                "Route 53 change submitted"
            ),
            Err(e) => tracing::warn!(
                zone_id,
                domain = %record.name,
                error = %e,
                "change accepted but ChangeInfo could not be parsed"
            ),
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
