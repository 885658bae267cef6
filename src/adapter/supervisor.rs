use crate::domain::AdapterError;
use crate::transport::{AdapterTransport, Connection, TransportError, TransportOptions};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Reconnecting,
    Terminated,
}

/// Sole owner of the adapter's live connection.
///
/// A reconnect is a single dial with the original address and options.
/// There is no retry loop: if that dial fails the supervisor is
/// `Terminated` and the error is handed back to the owner.
pub struct ConnectionSupervisor {
    transport: Arc<dyn AdapterTransport>,
    address: String,
    options: TransportOptions,
    conn: Box<dyn Connection>,
    state: ConnectionState,
}

impl ConnectionSupervisor {
    /// Dials the initial connection.
    pub async fn connect(
        transport: Arc<dyn AdapterTransport>,
        address: impl Into<String>,
        options: TransportOptions,
    ) -> Result<Self, AdapterError> {
        let address = address.into();
        let conn = transport
            .dial(&address, &options)
            .await
            .map_err(|source| AdapterError::Dial {
                address: address.clone(),
                source,
            })?;

        Ok(Self {
            transport,
            address,
            options,
            conn,
            state: ConnectionState::Connected,
        })
    }

    pub async fn write(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        self.conn.write(payload).await
    }

    /// Replaces the held connection with a freshly dialed one.
    pub async fn reconnect(&mut self) -> Result<(), AdapterError> {
        self.state = ConnectionState::Reconnecting;

        match self.transport.dial(&self.address, &self.options).await {
            Ok(conn) => {
                self.conn = conn;
                self.state = ConnectionState::Connected;
                info!("Connection reestablished to {}", self.address);
                Ok(())
            }
            Err(source) => {
                self.state = ConnectionState::Terminated;
                error!("fatal: could not reconnect to {}: {}", self.address, source);
                Err(AdapterError::ReconnectFailed {
                    address: self.address.clone(),
                    source,
                })
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("address", &self.address)
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
