use crate::transport::TransportError;
use thiserror::Error;

/// Exit status of the process when the connection could not be re-dialed.
pub const RECONNECT_FAILURE_EXIT_CODE: i32 = 3;

/// Errors surfaced by the adapter to its owner.
///
/// Everything except `ReconnectFailed` happens at construction time and
/// means no adapter was created. Serialization and write failures never
/// appear here: the delivery loop recovers from them itself.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    #[error("Unable to find transport '{transport}' for adapter: {adapter}")]
    UnknownTransport { adapter: String, transport: String },

    #[error("Dial to {address} failed: {source}")]
    Dial {
        address: String,
        #[source]
        source: TransportError,
    },

    #[error("Could not reconnect to {address}: {source}")]
    ReconnectFailed {
        address: String,
        #[source]
        source: TransportError,
    },
}

impl AdapterError {
    /// Whether the error ends a running delivery loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AdapterError::ReconnectFailed { .. })
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AdapterError::UnknownAdapter(_) | AdapterError::UnknownTransport { .. }
        )
    }

    /// Process exit status the binary uses for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            RECONNECT_FAILURE_EXIT_CODE
        } else {
            1
        }
    }
}
