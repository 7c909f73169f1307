//! Channel configuration for engine communication

/// Buffer configuration for the worker → scheduler event channel
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Event channel buffer size (workers -> scheduler)
    pub events_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            events_buffer: 1_024,
        }
    }
}

impl ChannelConfig {
    /// Create a channel config with a custom event buffer size
    pub fn with_events_buffer(mut self, size: usize) -> Self {
        self.events_buffer = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_default() {
        let config = ChannelConfig::default();
        assert_eq!(config.events_buffer, 1_024);
    }

    #[test]
    fn test_channel_config_builder() {
        let config = ChannelConfig::default().with_events_buffer(64);
        assert_eq!(config.events_buffer, 64);
    }
}
