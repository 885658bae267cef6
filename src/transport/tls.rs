use super::{AdapterTransport, Connection, TransportError, TransportOptions, resolve};
use async_trait::async_trait;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

/// TCP wrapped in a rustls client session.
///
/// Options:
/// - `ca_file` (required): PEM bundle of trusted root certificates.
/// - `server_name`: name to verify the peer against; defaults to the host
///   part of the address.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsTransport;

#[async_trait]
impl AdapterTransport for TlsTransport {
    async fn dial(
        &self,
        address: &str,
        options: &TransportOptions,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let ca_file = options
            .get("ca_file")
            .ok_or_else(|| TransportError::MissingOption("ca_file".to_string()))?;
        let server_name = options
            .get("server_name")
            .cloned()
            .unwrap_or_else(|| host_part(address).to_string());

        let domain = ServerName::try_from(server_name.clone()).map_err(|e| {
            TransportError::InvalidOption {
                key: "server_name".to_string(),
                value: server_name.clone(),
                reason: e.to_string(),
            }
        })?;
        let connector = TlsConnector::from(Arc::new(client_config(Path::new(ca_file))?));

        let remote = resolve(address).await?;
        let stream = TcpStream::connect(remote).await?;
        let stream = connector.connect(domain, stream).await?;

        debug!("tls session established to {} ({})", remote, server_name);
        Ok(Box::new(TlsConnection { stream }))
    }
}

fn client_config(ca_file: &Path) -> Result<ClientConfig, TransportError> {
    let mut reader = BufReader::new(File::open(ca_file)?);
    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert?)?;
    }

    if roots.is_empty() {
        return Err(TransportError::InvalidOption {
            key: "ca_file".to_string(),
            value: ca_file.display().to_string(),
            reason: "no certificates found".to_string(),
        });
    }

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

/// Host part of `host:port`, without IPv6 brackets.
fn host_part(address: &str) -> &str {
    let host = address
        .rsplit_once(':')
        .map_or(address, |(host, _)| host);
    host.trim_start_matches('[').trim_end_matches(']')
}

pub struct TlsConnection {
    stream: TlsStream<TcpStream>,
}

#[async_trait]
impl Connection for TlsConnection {
    async fn write(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        self.stream.write_all(payload).await?;
        self.stream.flush().await?;
        Ok(payload.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_host_part() {
        assert_eq!(host_part("logs.example.com:5043"), "logs.example.com");
        assert_eq!(host_part("[::1]:5043"), "::1");
        assert_eq!(host_part("localhost"), "localhost");
    }

    #[tokio::test]
    async fn test_dial_requires_ca_file() {
        let result = TlsTransport
            .dial("127.0.0.1:5043", &TransportOptions::new())
            .await;
        assert!(matches!(result, Err(TransportError::MissingOption(ref key)) if key == "ca_file"));
    }

    #[tokio::test]
    async fn test_dial_rejects_empty_ca_bundle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a certificate").unwrap();

        let mut options = TransportOptions::new();
        options.insert(
            "ca_file".to_string(),
            file.path().display().to_string(),
        );

        let result = TlsTransport.dial("127.0.0.1:5043", &options).await;
        assert!(matches!(result, Err(TransportError::InvalidOption { ref key, .. }) if key == "ca_file"));
    }

    #[tokio::test]
    async fn test_dial_missing_ca_file_is_io_error() {
        let mut options = TransportOptions::new();
        options.insert(
            "ca_file".to_string(),
            "/nonexistent/logstash-ca.pem".to_string(),
        );

        let result = TlsTransport.dial("127.0.0.1:5043", &options).await;
        assert!(matches!(result, Err(TransportError::Io(_))));
    }
}
