use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Could not resolve {address}: {reason}")]
    Resolve { address: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid option {key}={value}: {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing required option: {0}")]
    MissingOption(String),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Connection closed by peer")]
    Closed,
}

impl TransportError {
    /// Whether the error came from the network rather than from the route's
    /// own settings.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TransportError::Io(_) | TransportError::Resolve { .. } | TransportError::Closed
        )
    }
}
