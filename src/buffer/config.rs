// src/buffer/config.rs

use derive_builder::Builder;
use std::time::Duration;

use super::types::BufferError;

#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Maximum number of items held before a flush is forced
    #[builder(default = "1")]
    pub(crate) capacity: usize,

    /// Longest interval allowed between two flushes
    pub(crate) max_delay: Duration,
}

impl Config {
    /// Builds a validated config from its two parameters.
    pub fn new(capacity: usize, max_delay: Duration) -> Result<Self, BufferError> {
        ConfigBuilder::default()
            .capacity(capacity)
            .max_delay(max_delay)
            .build()
            .map_err(BufferError::from)
    }

    /// Returns the item count that forces an inline flush
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the maximum delay between flushes
    #[inline]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub(crate) fn validate(&self) -> Result<(), BufferError> {
        check(Some(self.capacity), Some(self.max_delay)).map_err(BufferError::InvalidConfig)
    }
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check(self.capacity, self.max_delay)
    }
}

fn check(capacity: Option<usize>, max_delay: Option<Duration>) -> Result<(), String> {
    if capacity == Some(0) {
        return Err("capacity must be positive".to_string());
    }
    if max_delay.is_some_and(|d| d.is_zero()) {
        return Err("max_delay must be positive".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_capacity() {
        let config = ConfigBuilder::default()
            .max_delay(Duration::from_secs(1))
            .build()
            .unwrap();

        assert_eq!(config.capacity(), 1);
        assert_eq!(config.max_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_builder_requires_max_delay() {
        let result = ConfigBuilder::default().capacity(10).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Config::new(0, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BufferError::InvalidConfig(ref msg) if msg.contains("capacity")));
    }

    #[test]
    fn test_zero_delay_rejected() {
        let err = Config::new(5, Duration::ZERO).unwrap_err();
        assert!(matches!(err, BufferError::InvalidConfig(ref msg) if msg.contains("max_delay")));
    }

    #[test]
    fn test_validate_catches_hand_built_config() {
        let config = Config {
            capacity: 0,
            max_delay: Duration::from_millis(10),
        };
        assert!(config.validate().is_err());

        let config = Config::new(3, Duration::from_millis(10)).unwrap();
        assert!(config.validate().is_ok());
    }
}
