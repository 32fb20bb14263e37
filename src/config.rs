//! Connection configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the call timeout in milliseconds.
pub const ENV_CALL_TIMEOUT_MS: &str = "ORACLE_BINDS_CALL_TIMEOUT_MS";
/// Environment variable holding the maximum bind size in bytes.
pub const ENV_MAX_BIND_SIZE: &str = "ORACLE_BINDS_MAX_BIND_SIZE";
/// Environment variable holding the initial output buffer capacity in bytes.
pub const ENV_OUT_BUFFER_CAPACITY: &str = "ORACLE_BINDS_OUT_BUFFER_CAPACITY";

/// Default largest `maxSize` a bind may declare (1 GiB).
pub const DEFAULT_MAX_BIND_SIZE: u32 = 1 << 30;
/// Default initial capacity of an output buffer.
pub const DEFAULT_OUT_BUFFER_CAPACITY: usize = 4000;

/// Settings applied to every execution on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Maximum time to wait for the backend to answer a call (default: none).
    pub call_timeout: Option<Duration>,
    /// Largest `maxSize` accepted on a bind.
    pub max_bind_size: u32,
    /// Capacity reserved up front for each output buffer; buffers grow
    /// beyond this only when the backend returns more data.
    pub out_buffer_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            call_timeout: None,
            max_bind_size: DEFAULT_MAX_BIND_SIZE,
            out_buffer_capacity: DEFAULT_OUT_BUFFER_CAPACITY,
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the call timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use oracle_binds::ConnectionConfig;
    /// use std::time::Duration;
    ///
    /// let config = ConnectionConfig::new().with_call_timeout(Duration::from_secs(5));
    /// assert_eq!(config.call_timeout, Some(Duration::from_secs(5)));
    /// ```
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Set the largest `maxSize` a bind may declare.
    pub fn with_max_bind_size(mut self, max_bind_size: u32) -> Self {
        self.max_bind_size = max_bind_size;
        self
    }

    /// Set the initial output buffer capacity.
    pub fn with_out_buffer_capacity(mut self, capacity: usize) -> Self {
        self.out_buffer_capacity = capacity;
        self
    }

    /// Build a configuration from `ORACLE_BINDS_*` environment variables.
    ///
    /// Unset variables keep their defaults. A call timeout of 0 disables it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_CALL_TIMEOUT_MS)? {
            config.call_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(size) = parse_var::<u32>(&lookup, ENV_MAX_BIND_SIZE)? {
            if size == 0 {
                return Err(invalid(ENV_MAX_BIND_SIZE, "0"));
            }
            config.max_bind_size = size;
        }
        if let Some(capacity) = parse_var::<usize>(&lookup, ENV_OUT_BUFFER_CAPACITY)? {
            config.out_buffer_capacity = capacity;
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, &value)),
        None => Ok(None),
    }
}

fn invalid(key: &str, value: &str) -> Error {
    Error::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    }
}
