use super::{AdapterTransport, TcpTransport, TlsTransport, UdpTransport};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lookup table from transport name to transport.
///
/// Built by the host and handed to the adapter factory; there is no
/// process-wide registry.
#[derive(Clone, Default)]
pub struct AdapterTransports {
    transports: HashMap<String, Arc<dyn AdapterTransport>>,
}

impl AdapterTransports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the built-in `udp`, `tcp` and `tls` transports.
    pub fn with_defaults() -> Self {
        let mut transports = Self::new();
        transports.register("udp", UdpTransport);
        transports.register("tcp", TcpTransport);
        transports.register("tls", TlsTransport);
        transports
    }

    /// Registers `transport` under `name`, replacing any previous entry.
    pub fn register<T>(&mut self, name: impl Into<String>, transport: T)
    where
        T: AdapterTransport + 'static,
    {
        self.register_arc(name, Arc::new(transport));
    }

    pub fn register_arc(&mut self, name: impl Into<String>, transport: Arc<dyn AdapterTransport>) {
        self.transports.insert(name.into(), transport);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn AdapterTransport>> {
        self.transports.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transports.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transports.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AdapterTransports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterTransports")
            .field("transports", &self.names())
            .finish()
    }
}
