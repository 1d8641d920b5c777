//! Connection and aggregation options

use crate::mapping::CollectionMapping;
use docbridge_common::{DocBridgeError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Connection pool configuration passed through to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool (default: 5)
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool (default: 20)
    pub max_pool_size: Option<u32>,
    /// Maximum time a connection can remain idle before being closed (default: none)
    #[serde(with = "opt_secs")]
    pub max_idle_time: Option<Duration>,
    /// Connection timeout (default: 10s)
    #[serde(with = "opt_secs")]
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout (default: 30s)
    #[serde(with = "opt_secs")]
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: Some(5),
            max_pool_size: Some(20),
            max_idle_time: None,
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            app_name: Some("docbridge".to_string()),
        }
    }
}

/// Options recognised by `Database::connect`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Default `allowDiskUse` for aggregations (default: true)
    pub allow_disk_use: bool,
    /// Driver pool settings
    pub pool: PoolConfig,
    /// Aliases merged into the facade's table once connected
    pub collection_mapping: CollectionMapping,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            allow_disk_use: true,
            pool: PoolConfig::default(),
            collection_mapping: CollectionMapping::new(),
        }
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from `DOCBRIDGE_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Ok(value) = env::var("DOCBRIDGE_ALLOW_DISK_USE") {
            options.allow_disk_use = parse_env("DOCBRIDGE_ALLOW_DISK_USE", &value)?;
        }
        if let Ok(value) = env::var("DOCBRIDGE_APP_NAME") {
            options.pool.app_name = Some(value);
        }
        if let Ok(value) = env::var("DOCBRIDGE_MIN_POOL_SIZE") {
            options.pool.min_pool_size = Some(parse_env("DOCBRIDGE_MIN_POOL_SIZE", &value)?);
        }
        if let Ok(value) = env::var("DOCBRIDGE_MAX_POOL_SIZE") {
            options.pool.max_pool_size = Some(parse_env("DOCBRIDGE_MAX_POOL_SIZE", &value)?);
        }

        Ok(options)
    }

    pub fn with_allow_disk_use(mut self, allow: bool) -> Self {
        self.allow_disk_use = allow;
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_mapping(mut self, mapping: impl Into<CollectionMapping>) -> Self {
        self.collection_mapping = mapping.into();
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DocBridgeError::Validation(format!("invalid {}={:?}: {}", key, value, e)))
}

/// Per-call aggregation options; unset fields fall back to connection defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateOptions {
    pub allow_disk_use: Option<bool>,
    pub batch_size: Option<u32>,
    pub max_time: Option<Duration>,
}

impl AggregateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_disk_use(mut self, allow: bool) -> Self {
        self.allow_disk_use = Some(allow);
        self
    }

    pub fn batch_size(mut self, size: u32) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Fill unset fields from the connection defaults
    pub fn merged_with_defaults(mut self, allow_disk_use: bool) -> Self {
        self.allow_disk_use.get_or_insert(allow_disk_use);
        self
    }
}

/// Durations as (possibly fractional) seconds: `1.5` is 1500ms
mod opt_secs {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}
