use super::{AdapterTransport, Connection, TransportError, TransportOptions, bool_option, resolve};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// Stream transport over plain TCP.
///
/// Options:
/// - `nodelay`: set `TCP_NODELAY` on the socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

#[async_trait]
impl AdapterTransport for TcpTransport {
    async fn dial(
        &self,
        address: &str,
        options: &TransportOptions,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let nodelay = bool_option(options, "nodelay")?;
        let remote = resolve(address).await?;

        let stream = TcpStream::connect(remote).await?;
        if let Some(nodelay) = nodelay {
            stream.set_nodelay(nodelay)?;
        }

        debug!("tcp connection established to {}", remote);
        Ok(Box::new(TcpConnection { stream }))
    }
}

#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

#[async_trait]
impl Connection for TcpConnection {
    async fn write(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        self.stream.write_all(payload).await?;
        Ok(payload.len())
    }
}
