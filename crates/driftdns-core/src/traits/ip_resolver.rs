// # IP Resolver Trait
//
// Defines the interface for discovering the caller's current public IP.
//
// ## Implementations
//
// - HTTP IP-echo endpoint: `driftdns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use driftdns_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//
//     let ip = resolver.resolve().await?;
//     println!("public address: {ip}");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for public IP resolver implementations
///
/// The reconciler calls [`IpResolver::resolve`] exactly once per pass and
/// compares every configured domain against that one value.
///
/// # Contract
///
/// - One outbound request per call, no internal retry. A failed pass is
///   retried by the next scheduler tick.
/// - No caching between calls; every pass sees a fresh value.
/// - The returned string is the address as reported by the source, trimmed.
///   Its format is not validated here.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the caller's current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address in dotted-decimal form
    /// - `Err(Error::Network)`: Connection failure, non-success status, or timeout
    async fn resolve(&self) -> Result<String, crate::Error>;

    /// Short description of the source (for logging)
    fn source_name(&self) -> &str {
        "ip-resolver"
    }
}
