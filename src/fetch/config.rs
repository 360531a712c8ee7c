use crate::dns::{GaiResolver, HickoryResolver, Resolve};
use crate::http::parser::{ParserLimits, DEFAULT_MAX_HEADER_BYTES};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Resolver used when the caller does not supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// getaddrinfo on the blocking pool.
    #[default]
    System,
    Hickory,
}

impl ResolverKind {
    pub fn build(self) -> Arc<dyn Resolve> {
        match self {
            ResolverKind::System => Arc::new(GaiResolver::new()),
            ResolverKind::Hickory => Arc::new(HickoryResolver::new()),
        }
    }
}

/// Per-fetch settings.
///
/// Missing fields take their defaults when deserialized, so a partial
/// JSON document such as `{"service": "8443"}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Service name (`https`, `http`) or numeric port.
    pub service: String,
    pub resolver: ResolverKind,
    /// Deadline for the whole fetch, measured from its start.
    pub timeout: Option<Duration>,
    pub max_header_bytes: usize,
    pub max_body_bytes: Option<usize>,
    /// Size of each read from the transport.
    pub read_buffer_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            service: "https".to_string(),
            resolver: ResolverKind::System,
            timeout: None,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: None,
            read_buffer_size: 8 * 1024,
        }
    }
}

impl FetchConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn resolver(mut self, resolver: ResolverKind) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_header_bytes(mut self, limit: usize) -> Self {
        self.max_header_bytes = limit;
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub(crate) fn limits(&self) -> ParserLimits {
        ParserLimits {
            max_header_bytes: self.max_header_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }
}
