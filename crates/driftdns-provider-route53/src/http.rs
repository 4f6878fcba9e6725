//! Signed HTTP requests and error mapping

use chrono::Utc;
use driftdns_core::{Error, ProviderErrorKind, Result};
use reqwest::{Method, StatusCode};

use super::sign::canonical_query;
use super::types::parse_error_body;
use super::{PROVIDER_NAME, Route53Provider};

const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "ExpiredToken",
    "IncompleteSignature",
    "InvalidClientTokenId",
    "MissingAuthenticationToken",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
];

const THROTTLE_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "PriorRequestNotComplete",
];

const NOT_FOUND_ERROR_CODES: &[&str] = &["NoSuchHostedZone", "NoSuchChange"];

const INVALID_REQUEST_ERROR_CODES: &[&str] = &[
    "InvalidChangeBatch",
    "InvalidInput",
    "InvalidArgument",
    "InvalidDomainName",
];

/// Map an HTTP status and Route 53 error code to a provider error kind
pub(crate) fn classify(status: StatusCode, code: &str) -> ProviderErrorKind {
    if AUTH_ERROR_CODES.contains(&code) {
        return ProviderErrorKind::Authentication;
    }
    if THROTTLE_ERROR_CODES.contains(&code) {
        return ProviderErrorKind::RateLimited;
    }
    if NOT_FOUND_ERROR_CODES.contains(&code) {
        return ProviderErrorKind::NotFound;
    }
    if INVALID_REQUEST_ERROR_CODES.contains(&code) {
        return ProviderErrorKind::InvalidRequest;
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorKind::Authentication,
        StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::RateLimited,
        StatusCode::NOT_FOUND => ProviderErrorKind::NotFound,
        s if s.is_server_error() => ProviderErrorKind::Transient,
        s if s.is_client_error() => ProviderErrorKind::InvalidRequest,
        _ => ProviderErrorKind::Other,
    }
}

/// Convert a non-2xx response into an `Error::Provider`
pub(crate) fn response_error(status: StatusCode, body: &str) -> Error {
    let (code, message) = parse_error_body(body).unwrap_or_else(|| {
        let snippet: String = body.chars().take(200).collect();
        (String::new(), snippet)
    });

    let kind = classify(status, &code);
    let message = if code.is_empty() {
        format!("HTTP {}: {}", status.as_u16(), message)
    } else {
        format!("HTTP {} {}: {}", status.as_u16(), code, message)
    };

    Error::provider(PROVIDER_NAME, kind, message)
}

impl Route53Provider {
    /// Send a SigV4-signed request and return the response body
    ///
    /// Non-2xx responses become `Error::Provider` with a classified kind;
    /// transport failures become `ProviderErrorKind::Network`.
    pub(crate) async fn send_signed(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<String>,
    ) -> Result<String> {
        let query = canonical_query(query);
        let payload = body.unwrap_or_default();

        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let host = self.host_header();
        let authorization = self.signer.authorization(
            method.as_str(),
            path,
            &query,
            &[("host", host.as_str()), ("x-amz-date", amz_date.as_str())],
            payload.as_bytes(),
            &amz_date,
        );

        let mut url = format!("{}{}", self.base_url(), path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        tracing::debug!(method = %method, url = %url, "route53 request");

        let mut request = self
            .client
            .request(method, &url)
            .header("x-amz-date", &amz_date)
            .header("authorization", authorization);
        if !payload.is_empty() {
            request = request.header("content-type", "text/xml").body(payload);
        }

        let response = request.send().await.map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                ProviderErrorKind::Network,
                format!("Request failed: {}", e),
            )
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                ProviderErrorKind::Network,
                format!("Failed to read response: {}", e),
            )
        })?;

        if !status.is_success() {
            return Err(response_error(status, &text));
        }

        Ok(text)
    }
}
