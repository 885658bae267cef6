//! Record source: follows the log streams of running containers through the
//! Docker Engine API and feeds them to the adapter as [`LogRecord`]s.

pub mod docker;

pub use docker::DockerCollector;

use crate::domain::{ContainerMeta, LogRecord};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Containers carrying this label with value `true` are never forwarded.
pub const IGNORE_LABEL: &str = "logstash-adapter.ignore";

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Docker connection failed: {0}")]
    ConnectionFailed(#[from] bollard::errors::Error),
    #[error("Container discovery failed: {0}")]
    DiscoveryFailed(String),
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Unix socket of the Docker daemon; bollard's defaults when `None`.
    pub docker_host: Option<String>,
    /// `key` or `key=value`; only matching containers are followed.
    pub filter_label: Option<String>,
    /// Lines of history to replay per container (`all` or a number).
    pub tail: String,
    /// How often running containers are listed again.
    pub discovery_interval: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            docker_host: None,
            filter_label: None,
            tail: "0".to_string(),
            discovery_interval: Duration::from_secs(10),
        }
    }
}

/// Whether a container with `labels` should be followed.
pub fn should_forward(labels: &HashMap<String, String>, filter_label: Option<&str>) -> bool {
    if labels
        .get(IGNORE_LABEL)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return false;
    }

    match filter_label {
        None => true,
        Some(filter) => match filter.split_once('=') {
            Some((key, value)) => labels.get(key).is_some_and(|v| v == value),
            None => labels.contains_key(filter),
        },
    }
}

/// Longest partial line kept across chunks before it is sent as is.
pub const MAX_PENDING_LINE: usize = 1024 * 1024;

/// Reassembles lines from container output chunks.
///
/// Docker frames follow the container's writes, not its lines: a TTY
/// container or a line over 16 KiB arrives split across chunks. Only
/// complete lines are emitted; the tail after the last `\n` waits for the
/// next chunk, or for [`finish`](Self::finish) when the stream ends.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    max_pending: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_limit(MAX_PENDING_LINE)
    }

    pub fn with_limit(max_pending: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_pending,
        }
    }

    /// Appends `chunk` and returns a record for every line it completes.
    pub fn push(&mut self, chunk: &[u8], container: &ContainerMeta) -> Vec<LogRecord> {
        self.pending.extend_from_slice(chunk);

        let mut records = Vec::new();
        if let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') {
            let rest = self.pending.split_off(last_newline + 1);
            let complete = std::mem::replace(&mut self.pending, rest);
            records.extend(
                complete
                    .split(|&b| b == b'\n')
                    .filter_map(|line| line_record(line, container)),
            );
        }

        if self.pending.len() >= self.max_pending {
            let oversized = std::mem::take(&mut self.pending);
            records.extend(line_record(&oversized, container));
        }

        records
    }

    /// Emits the unterminated tail, if any.
    pub fn finish(&mut self, container: &ContainerMeta) -> Option<LogRecord> {
        let rest = std::mem::take(&mut self.pending);
        line_record(&rest, container)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn line_record(line: &[u8], container: &ContainerMeta) -> Option<LogRecord> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return None;
    }
    Some(LogRecord::new(
        String::from_utf8_lossy(line),
        container.clone(),
    ))
}
