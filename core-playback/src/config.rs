//! # Playback Configuration

use std::time::Duration;

pub const MIN_PLAYBACK_RATE: f32 = 0.5;
pub const MAX_PLAYBACK_RATE: f32 = 2.0;

/// Playback controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// How long `play` waits for the source to become playable.
    ///
    /// Default: 10 seconds.
    pub canplay_timeout: Duration,

    /// Fixed delay before an automatic load retry.
    ///
    /// Default: 1 second.
    pub load_retry_delay: Duration,

    /// Load retries when the caller does not pass its own budget.
    ///
    /// Default: 2.
    pub default_max_retries: u32,

    /// Finished sessions kept in history; the oldest is dropped first.
    ///
    /// Default: 10.
    pub history_capacity: usize,

    /// Default: 1.0.
    pub default_volume: f32,

    /// Default: 1.0.
    pub default_playback_rate: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            canplay_timeout: Duration::from_secs(10),
            load_retry_delay: Duration::from_secs(1),
            default_max_retries: 2,
            history_capacity: 10,
            default_volume: 1.0,
            default_playback_rate: 1.0,
        }
    }
}

impl PlaybackConfig {
    pub fn with_canplay_timeout(mut self, timeout: Duration) -> Self {
        self.canplay_timeout = timeout;
        self
    }

    pub fn with_load_retry_delay(mut self, delay: Duration) -> Self {
        self.load_retry_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.default_max_retries = retries;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.canplay_timeout.is_zero() {
            return Err("canplay_timeout must be > 0".to_string());
        }

        if self.history_capacity == 0 {
            return Err("history_capacity must be > 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err("default_volume must be between 0.0 and 1.0".to_string());
        }

        if !(MIN_PLAYBACK_RATE..=MAX_PLAYBACK_RATE).contains(&self.default_playback_rate) {
            return Err(format!(
                "default_playback_rate must be between {} and {}",
                MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlaybackConfig::default();
        assert_eq!(config.history_capacity, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_defaults() {
        let config = PlaybackConfig {
            default_playback_rate: 3.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(PlaybackConfig::default()
            .with_history_capacity(0)
            .validate()
            .is_err());
    }
}
