#![allow(dead_code)]

use async_trait::async_trait;
use logstash_adapter::transport::TransportOptions;
use logstash_adapter::{
    AdapterTransport, AdapterTransports, Connection, ContainerMeta, LogRecord, TransportError,
};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared log of everything the in-memory transport saw.
#[derive(Debug, Default)]
pub struct Recording {
    pub dials: Mutex<Vec<(String, TransportOptions)>>,
    pub writes: Mutex<Vec<Vec<u8>>>,
    pub write_attempts: AtomicUsize,
}

impl Recording {
    pub fn dial_count(&self) -> usize {
        self.dials.lock().len()
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    pub fn written_json(&self) -> Vec<serde_json::Value> {
        self.written()
            .iter()
            .map(|payload| serde_json::from_slice(payload).unwrap())
            .collect()
    }

    pub fn written_messages(&self) -> Vec<String> {
        self.written_json()
            .iter()
            .map(|value| value["message"].as_str().unwrap().to_string())
            .collect()
    }
}

/// In-memory transport with scripted failures.
///
/// `failing_writes` holds zero-based indices of write attempts (across all
/// connections) that fail. `dial_results` is consumed per dial; once empty,
/// dials succeed.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub recording: Arc<Recording>,
    failing_writes: Arc<HashSet<usize>>,
    dial_results: Arc<Mutex<VecDeque<bool>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.failing_writes = Arc::new(indices.into_iter().collect());
        self
    }

    pub fn dial_script(self, results: impl IntoIterator<Item = bool>) -> Self {
        self.dial_results.lock().extend(results);
        self
    }

    pub fn registry(&self, name: &str) -> AdapterTransports {
        let mut transports = AdapterTransports::new();
        transports.register(name, self.clone());
        transports
    }
}

#[async_trait]
impl AdapterTransport for RecordingTransport {
    async fn dial(
        &self,
        address: &str,
        options: &TransportOptions,
    ) -> Result<Box<dyn Connection>, TransportError> {
        self.recording
            .dials
            .lock()
            .push((address.to_string(), options.clone()));

        let succeed = self.dial_results.lock().pop_front().unwrap_or(true);
        if !succeed {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted dial failure",
            )));
        }

        Ok(Box::new(RecordingConnection {
            recording: self.recording.clone(),
            failing_writes: self.failing_writes.clone(),
        }))
    }
}

struct RecordingConnection {
    recording: Arc<Recording>,
    failing_writes: Arc<HashSet<usize>>,
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn write(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        let attempt = self.recording.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_writes.contains(&attempt) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }

        self.recording.writes.lock().push(payload.to_vec());
        Ok(payload.len())
    }
}

pub fn record(message: &str) -> LogRecord {
    LogRecord::new(
        message,
        ContainerMeta::new("4f1c2b3a9d8e7f6a5b4c3d2e1f0a9b8c", "/web", "nginx:1.27", "web-1"),
    )
}
