//! Logstash adapter: turns a stream of [`LogRecord`]s into JSON writes on a
//! single transport connection.
//!
//! Delivery is at-most-once. A record whose write fails is dropped; the
//! connection is re-dialed exactly once, and if that dial fails the stream
//! ends with [`AdapterError::ReconnectFailed`].

pub mod message;
pub mod stats;
pub mod supervisor;

pub use message::LogstashMessage;
pub use stats::{AdapterStats, AdapterStatsSnapshot};
pub use supervisor::{ConnectionState, ConnectionSupervisor};

use crate::domain::{AdapterError, LogRecord};
use crate::transport::{AdapterTransports, Route};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const ADAPTER_NAME: &str = "logstash";

/// Transport used when the route does not name one.
pub const DEFAULT_TRANSPORT: &str = "udp";

#[derive(Debug)]
pub struct LogstashAdapter {
    route: Route,
    supervisor: ConnectionSupervisor,
    stats: Arc<AdapterStats>,
}

impl LogstashAdapter {
    /// Looks up the route's transport and dials the initial connection.
    pub async fn new(route: Route, transports: &AdapterTransports) -> Result<Self, AdapterError> {
        if route.adapter_name() != ADAPTER_NAME {
            return Err(AdapterError::UnknownAdapter(route.adapter.clone()));
        }

        let transport_name = route.adapter_transport(DEFAULT_TRANSPORT);
        let transport =
            transports
                .lookup(transport_name)
                .ok_or_else(|| AdapterError::UnknownTransport {
                    adapter: route.adapter.clone(),
                    transport: transport_name.to_string(),
                })?;

        let supervisor =
            ConnectionSupervisor::connect(transport, route.address.clone(), route.options.clone())
                .await?;

        info!(
            "logstash adapter {} connected to {} over {}",
            route.id, route.address, transport_name
        );

        Ok(Self {
            route,
            supervisor,
            stats: Arc::new(AdapterStats::new()),
        })
    }

    /// Runs the delivery loop until every sender of `logstream` is dropped.
    ///
    /// Returns `Err` only when a failed write could not be followed by a
    /// successful reconnect; the caller decides how to terminate.
    pub async fn stream(&mut self, mut logstream: mpsc::Receiver<LogRecord>) -> Result<(), AdapterError> {
        while let Some(record) = logstream.recv().await {
            self.stats.record_received();
            let container_id = record.container.short_id().to_string();

            let payload = match LogstashMessage::from(record).to_payload() {
                Ok(payload) => payload,
                // Unreachable in practice: every field is a `String`, which
                // serde_json always encodes.
                Err(e) => {
                    error!("logstash: {}", e);
                    self.stats.record_serialization_error();
                    continue;
                }
            };

            match self.supervisor.write(&payload).await {
                Ok(written) => {
                    debug!("sent {} bytes for container {}", written, container_id);
                    self.stats.record_sent(written);
                }
                Err(e) => {
                    warn!(
                        network = e.is_network(),
                        "logstash (new connection): {}", e
                    );
                    self.stats.record_write_error();
                    self.supervisor.reconnect().await?;
                    self.stats.record_reconnect();
                }
            }
        }

        let snapshot = self.stats.snapshot();
        info!(
            "log stream for route {} closed: {} received, {} sent, {} dropped, {} reconnects",
            self.route.id,
            snapshot.records_received,
            snapshot.records_sent,
            snapshot.records_dropped,
            snapshot.reconnects
        );
        Ok(())
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Shared handle to the live counters.
    pub fn stats(&self) -> Arc<AdapterStats> {
        self.stats.clone()
    }
}
