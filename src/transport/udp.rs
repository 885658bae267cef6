use super::{AdapterTransport, Connection, TransportError, TransportOptions, resolve};
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

/// Connectionless transport: each payload is one datagram.
///
/// Options:
/// - `bind`: local address to bind instead of an ephemeral one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpTransport;

#[async_trait]
impl AdapterTransport for UdpTransport {
    async fn dial(
        &self,
        address: &str,
        options: &TransportOptions,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let remote = resolve(address).await?;
        let local = bind_address(options, remote)?;

        let socket = UdpSocket::bind(local).await?;
        socket.connect(remote).await?;

        debug!("udp socket {} connected to {}", socket.local_addr()?, remote);
        Ok(Box::new(UdpConnection { socket, remote }))
    }
}

fn bind_address(options: &TransportOptions, remote: SocketAddr) -> Result<SocketAddr, TransportError> {
    if let Some(bind) = options.get("bind") {
        return bind.parse().map_err(|e: std::net::AddrParseError| {
            TransportError::InvalidOption {
                key: "bind".to_string(),
                value: bind.clone(),
                reason: e.to_string(),
            }
        });
    }

    Ok(if remote.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    })
}

#[derive(Debug)]
pub struct UdpConnection {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpConnection {
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }
}

#[async_trait]
impl Connection for UdpConnection {
    async fn write(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        Ok(self.socket.send(payload).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_datagram_reaches_listener() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let mut conn = UdpTransport
            .dial(&address, &TransportOptions::new())
            .await
            .unwrap();
        let written = conn.write(br#"{"message":"hi"}"#).await.unwrap();
        assert_eq!(written, 16);

        let mut buf = [0u8; 64];
        let (len, _) = listener.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], br#"{"message":"hi"}"#);
    }

    #[test]
    fn test_bind_address_follows_remote_family() {
        let options = TransportOptions::new();
        let v4 = bind_address(&options, "127.0.0.1:5000".parse().unwrap()).unwrap();
        assert!(v4.is_ipv4());
        let v6 = bind_address(&options, "[::1]:5000".parse().unwrap()).unwrap();
        assert!(v6.is_ipv6());
    }

    #[test]
    fn test_invalid_bind_option() {
        let mut options = TransportOptions::new();
        options.insert("bind".to_string(), "not-an-address".to_string());
        let result = bind_address(&options, "127.0.0.1:5000".parse().unwrap());
        assert!(matches!(result, Err(TransportError::InvalidOption { .. })));
    }
}
