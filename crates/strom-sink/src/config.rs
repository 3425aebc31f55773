//! Sink engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SinkConfig {
    /// Number of sender worker threads.
    pub pool_size: usize,
    /// Maximum run units waiting in the bulk queue.
    pub queue_capacity: usize,
    /// Budget for the whole shutdown sequence before a warning is logged.
    #[serde(with = "duration_millis")]
    pub shutdown_timeout: Duration,
}

impl Default for SinkConfig {
    fn default() -> SinkConfig {
        SinkConfig {
            pool_size: 4,
            queue_capacity: 64,
            shutdown_timeout: Duration::from_millis(5000),
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SinkConfig::default();
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.shutdown_timeout, Duration::from_millis(5000));
    }
}
