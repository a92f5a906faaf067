//! Bridge configuration.
//!
//! Values are supplied by the host's configuration subsystem; the bridge
//! never reads them itself.

use std::time::Duration;

use taskmux_core::RetryPolicy;

/// Top-level configuration for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Deadline applied to operations submitted without an explicit timeout.
    pub default_operation_timeout: Duration,
    /// How often the expiry sweep scans the pending table. One periodic
    /// sweep serves every operation; there is no per-operation timer.
    pub sweep_interval: Duration,
    /// Bounded capacity of the outbound frame channel (backpressure toward
    /// submitters).
    pub outbound_channel_capacity: usize,
    /// Bounded capacity of the inbound invocation channel feeding worker
    /// dispatch.
    pub inbound_channel_capacity: usize,
    /// Upper bound on a single frame; larger frames are malformed.
    pub max_frame_len: usize,
    /// Retry policy attached to workflow starts that do not carry their own.
    pub default_retry_policy: Option<RetryPolicy>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_operation_timeout: Duration::from_secs(10),
            sweep_interval: Duration::from_millis(250),
            outbound_channel_capacity: 256,
            inbound_channel_capacity: 64,
            max_frame_len: 4 * 1024 * 1024,
            default_retry_policy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.default_operation_timeout, Duration::from_secs(10));
        assert_eq!(config.sweep_interval, Duration::from_millis(250));
        assert_eq!(config.outbound_channel_capacity, 256);
        assert_eq!(config.inbound_channel_capacity, 64);
        assert_eq!(config.max_frame_len, 4 * 1024 * 1024);
        assert!(config.default_retry_policy.is_none());
    }
}
