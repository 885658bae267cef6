//! Domain layer for logstash-adapter.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: one line of container output plus its container metadata
//! - `ContainerMeta`: identity of the container that produced a record
//! - `AdapterError`: construction and terminal delivery errors

pub mod error;
pub mod log_record;

pub use error::{AdapterError, RECONNECT_FAILURE_EXIT_CODE};
pub use log_record::{ContainerMeta, LogRecord};
