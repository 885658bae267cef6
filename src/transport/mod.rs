//! Pluggable transports.
//!
//! A transport knows how to dial an address and hand back a [`Connection`]
//! that accepts whole payloads. The adapter never names a concrete
//! transport; it looks one up in an [`AdapterTransports`] table by the name
//! the route selects.

pub mod error;
pub mod registry;
pub mod route;
pub mod tcp;
pub mod tls;
pub mod udp;

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;

#[cfg(test)]
use mockall::automock;

pub use error::TransportError;
pub use registry::AdapterTransports;
pub use route::{Route, RouteError};
pub use tcp::TcpTransport;
pub use tls::TlsTransport;
pub use udp::UdpTransport;

/// Transport-specific options, passed verbatim from the route to `dial`.
pub type TransportOptions = HashMap<String, String>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AdapterTransport: Send + Sync {
    async fn dial(
        &self,
        address: &str,
        options: &TransportOptions,
    ) -> Result<Box<dyn Connection>, TransportError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Connection: Send {
    /// Sends one full payload, returning the number of bytes written.
    async fn write(&mut self, payload: &[u8]) -> Result<usize, TransportError>;
}

/// Resolves `host:port` to the first address the resolver returns.
pub(crate) async fn resolve(address: &str) -> Result<SocketAddr, TransportError> {
    tokio::net::lookup_host(address)
        .await
        .map_err(|e| TransportError::Resolve {
            address: address.to_string(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| TransportError::Resolve {
            address: address.to_string(),
            reason: "no addresses returned".to_string(),
        })
}

/// Reads an optional boolean option (`true`/`false`, `1`/`0`).
pub(crate) fn bool_option(
    options: &TransportOptions,
    key: &str,
) -> Result<Option<bool>, TransportError> {
    let Some(value) = options.get(key) else {
        return Ok(None);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(TransportError::InvalidOption {
            key: key.to_string(),
            value: value.clone(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
