// Lock-free delivery statistics for a single adapter.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default)]
pub struct AdapterStats {
    records_received: AtomicU64,
    records_sent: AtomicU64,
    bytes_sent: AtomicU64,
    serialization_errors: AtomicU64,
    write_errors: AtomicU64,
    records_dropped: AtomicU64,
    reconnects: AtomicU64,
    last_write_time: AtomicU64,
}

impl AdapterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self, bytes: usize) {
        self.records_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.last_write_time.store(now, Ordering::Relaxed);
    }

    /// A record that could not be encoded; it is dropped.
    pub fn record_serialization_error(&self) {
        self.serialization_errors.fetch_add(1, Ordering::Relaxed);
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// A record whose write failed; it is dropped, not re-sent.
    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AdapterStatsSnapshot {
        AdapterStatsSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_sent: self.records_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            serialization_errors: self.serialization_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            last_write_time: self.last_write_time.load(Ordering::Relaxed),
        }
    }

    /// Fraction of received records that were written (1.0 when idle).
    pub fn delivery_rate(&self) -> f64 {
        let received = self.records_received.load(Ordering::Relaxed);
        if received == 0 {
            return 1.0;
        }
        self.records_sent.load(Ordering::Relaxed) as f64 / received as f64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterStatsSnapshot {
    pub records_received: u64,
    pub records_sent: u64,
    pub bytes_sent: u64,
    pub serialization_errors: u64,
    pub write_errors: u64,
    pub records_dropped: u64,
    pub reconnects: u64,
    /// Unix seconds of the last successful write, 0 if none.
    pub last_write_time: u64,
}
