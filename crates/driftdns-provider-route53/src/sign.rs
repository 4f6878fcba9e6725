//! AWS Signature Version 4
//!
//! Reference: <https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_sigv-create-signed-request.html>

use std::fmt::Write;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Percent-encode per RFC 3986 (unreserved characters kept)
pub(crate) fn uri_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Sorted, encoded `k=v&k=v` query string
pub(crate) fn canonical_query(params: &[(&str, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signing identity for one service in one region
#[derive(Clone)]
pub(crate) struct Signer {
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<REDACTED>")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

impl Signer {
    pub(crate) fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    pub(crate) fn region(&self) -> &str {
        &self.region
    }

    /// Build the `Authorization` header value
    ///
    /// `query` must already be canonical (see [`canonical_query`]); `headers`
    /// are every header that takes part in the signature, including `host`
    /// and `x-amz-date`. `amz_date` is `YYYYMMDD'T'HHMMSS'Z'`.
    pub(crate) fn authorization(
        &self,
        method: &str,
        path: &str,
        query: &str,
        headers: &[(&str, &str)],
        payload: &[u8],
        amz_date: &str,
    ) -> String {
        let mut sorted_headers: Vec<(String, &str)> = headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.trim()))
            .collect();
        sorted_headers.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical_headers = sorted_headers
            .iter()
            .fold(String::new(), |mut acc, (k, v)| {
                let _ = writeln!(acc, "{k}:{v}");
                acc
            });

        let signed_headers = sorted_headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{method}\n{path}\n{query}\n{canonical_headers}\n{signed_headers}\n{}",
            sha256_hex(payload)
        );
        tracing::trace!("CanonicalRequest:\n{}", canonical_request);

        let date = &amz_date[..amz_date.len().min(8)];
        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(date),
            string_to_sign.as_bytes(),
        ));

        format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key
        )
    }

    fn signing_key(&self, date: &str) -> Vec<u8> {
        let k_date = hmac_sha256(format!("AWS4{}", self.secret_key).as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
    const EXAMPLE_DATE: &str = "20150830T123600Z";

    fn iam_signer() -> Signer {
        Signer::new("AKIDEXAMPLE", EXAMPLE_SECRET, "us-east-1", "iam")
    }

    fn iam_headers() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Host", "iam.amazonaws.com"),
            ("Content-Type", "application/x-www-form-urlencoded; charset=utf-8"),
            ("X-Amz-Date", EXAMPLE_DATE),
        ]
    }

    fn extract_signature(auth: &str) -> &str {
        auth.split("Signature=").nth(1).unwrap_or_default()
    }

    #[test]
    fn matches_published_iam_example() {
        let query = canonical_query(&[
            ("Version", "2010-05-08".to_string()),
            ("Action", "ListUsers".to_string()),
        ]);
        assert_eq!(query, "Action=ListUsers&Version=2010-05-08");

        let auth = iam_signer().authorization("GET", "/", &query, &iam_headers(), b"", EXAMPLE_DATE);

        assert_eq!(
            auth,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date, \
             Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        );
    }

    #[test]
    fn header_order_does_not_matter() {
        let mut reversed = iam_headers();
        reversed.reverse();
        let query = "Action=ListUsers&Version=2010-05-08";

        let a = iam_signer().authorization("GET", "/", query, &iam_headers(), b"", EXAMPLE_DATE);
        let b = iam_signer().authorization("GET", "/", query, &reversed, b"", EXAMPLE_DATE);
        assert_eq!(a, b);
    }

    #[test]
    fn payload_and_region_change_signature() {
        let query = "";
        let base = iam_signer().authorization("POST", "/", query, &iam_headers(), b"", EXAMPLE_DATE);
        let with_body =
            iam_signer().authorization("POST", "/", query, &iam_headers(), b"<x/>", EXAMPLE_DATE);
        let other_region = Signer::new("AKIDEXAMPLE", EXAMPLE_SECRET, "cn-northwest-1", "iam")
            .authorization("POST", "/", query, &iam_headers(), b"", EXAMPLE_DATE);

        assert_ne!(extract_signature(&base), extract_signature(&with_body));
        assert_ne!(extract_signature(&base), extract_signature(&other_region));
        assert!(other_region.contains("/cn-northwest-1/iam/aws4_request"));
    }

    #[test]
    fn canonical_query_encodes_reserved_characters() {
        let query = canonical_query(&[
            ("type", "A".to_string()),
            ("name", "*.example.com.".to_string()),
        ]);
        assert_eq!(query, "name=%2A.example.com.&type=A");
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", iam_signer());
        assert!(!rendered.contains(EXAMPLE_SECRET));
        assert!(rendered.contains("<REDACTED>"));
    }
}
