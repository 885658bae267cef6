use super::TransportOptions;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Invalid route URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Route '{0}' has no host")]
    MissingHost(String),
    #[error("Route '{0}' has no port")]
    MissingPort(String),
}

/// Where an adapter sends its records and how.
///
/// `adapter` is the scheme of the route URI: `logstash` alone, or
/// `logstash+<transport>` to pick a transport explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub adapter: String,
    pub address: String,
    #[serde(default)]
    pub options: TransportOptions,
}

impl Route {
    pub fn new(adapter: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            adapter: adapter.into(),
            address: address.into(),
            options: TransportOptions::new(),
        }
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Parses `adapter[+transport]://host:port[?key=value&...]`.
    pub fn parse(uri: &str) -> Result<Self, RouteError> {
        let url = Url::parse(uri).map_err(|source| RouteError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RouteError::MissingHost(uri.to_string()))?;
        let port = url
            .port()
            .ok_or_else(|| RouteError::MissingPort(uri.to_string()))?;

        let mut route = Route::new(url.scheme(), format!("{host}:{port}"));
        route.options = url.query_pairs().into_owned().collect();
        Ok(route)
    }

    /// Adapter name without the transport suffix.
    pub fn adapter_name(&self) -> &str {
        self.adapter
            .split_once('+')
            .map_or(self.adapter.as_str(), |(name, _)| name)
    }

    /// Transport named by the route, or `default` when the scheme has none.
    pub fn adapter_transport<'a>(&'a self, default: &'a str) -> &'a str {
        match self.adapter.split_once('+') {
            Some((_, transport)) if !transport.is_empty() => transport,
            _ => default,
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s)
    }
}
