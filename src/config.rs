//! Dispatcher configuration and off-thread staging.
//!
//! `DispatchConfig` is validated before it ever reaches the audio thread.
//! Changes coming from a UI or control thread go through a `ConfigHandle`,
//! which pushes into a small SPSC ring. The dispatcher only drains that ring
//! at a block boundary, so a half-filled buffer is never resized.

use rtrb::{Consumer, Producer, RingBuffer};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigurationError, MAX_BUFFER_SIZE};

/// What the dispatcher emits for a frame slot that had no input.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderrunPolicy {
    /// Repeat the last emitted output frame
    #[default]
    HoldLast,
    /// Emit zeros
    Silence,
}

/// Block dispatch settings.
///
/// `frame_divider` = raw ticks per captured sample.
/// `buffer_size` = captured samples per callback.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub frame_divider: u32,
    pub buffer_size: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub underrun_policy: UnderrunPolicy,
}

impl DispatchConfig {
    /// Create a validated configuration
    pub fn new(frame_divider: u32, buffer_size: usize) -> Result<Self, ConfigurationError> {
        let config = Self {
            frame_divider,
            buffer_size,
            underrun_policy: UnderrunPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_frame_divider(mut self, frame_divider: u32) -> Self {
        self.frame_divider = frame_divider;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_underrun_policy(mut self, policy: UnderrunPolicy) -> Self {
        self.underrun_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.frame_divider == 0 {
            return Err(ConfigurationError::ZeroFrameDivider);
        }
        if self.buffer_size == 0 {
            return Err(ConfigurationError::ZeroBufferSize);
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigurationError::too_large(self.buffer_size));
        }
        Ok(())
    }

    /// Raw ticks consumed by one full block
    pub fn ticks_per_block(&self) -> u64 {
        self.frame_divider as u64 * self.buffer_size as u64
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            frame_divider: 1,
            buffer_size: 1,
            underrun_policy: UnderrunPolicy::default(),
        }
    }
}

/// Slots in the staging ring. Only the newest staged value matters.
const STAGING_CAPACITY: usize = 4;

/// Create a staging pair: the handle goes to the control thread, the
/// receiver is attached to a dispatcher.
pub fn staging() -> (ConfigHandle, ConfigStaging) {
    let (tx, rx) = RingBuffer::new(STAGING_CAPACITY);
    (ConfigHandle { tx }, ConfigStaging { rx })
}

/// Non-realtime side of config staging.
pub struct ConfigHandle {
    tx: Producer<DispatchConfig>,
}

impl ConfigHandle {
    /// Validate and stage a configuration for the next block boundary.
    ///
    /// The queue drops the newest entry when full: `StagingFull` means this
    /// config was not queued and should be staged again after a boundary
    /// drains the ring.
    pub fn stage(&mut self, config: DispatchConfig) -> Result<(), ConfigurationError> {
        config.validate()?;
        self.tx
            .push(config)
            .map_err(|_| ConfigurationError::StagingFull)
    }
}

/// Realtime side of config staging. Drained by the dispatcher.
pub struct ConfigStaging {
    rx: Consumer<DispatchConfig>,
}

impl ConfigStaging {
    /// Pop everything staged so far and keep the newest
    pub(crate) fn latest(&mut self) -> Option<DispatchConfig> {
        let mut latest = None;
        while let Ok(config) = self.rx.pop() {
            latest = Some(config);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_per_sample() {
        let config = DispatchConfig::default();
        assert_eq!(config.frame_divider, 1);
        assert_eq!(config.buffer_size, 1);
        assert_eq!(config.underrun_policy, UnderrunPolicy::HoldLast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_sizes() {
        assert_eq!(
            DispatchConfig::new(0, 16),
            Err(ConfigurationError::ZeroFrameDivider)
        );
        assert_eq!(
            DispatchConfig::new(1, 0),
            Err(ConfigurationError::ZeroBufferSize)
        );
    }

    #[test]
    fn rejects_oversized_buffer() {
        let result = DispatchConfig::new(1, MAX_BUFFER_SIZE + 1);
        assert!(matches!(
            result,
            Err(ConfigurationError::BufferTooLarge { requested, .. }) if requested == MAX_BUFFER_SIZE + 1
        ));
        assert!(DispatchConfig::new(1, MAX_BUFFER_SIZE).is_ok());
    }

    #[test]
    fn ticks_per_block_is_product() {
        let config = DispatchConfig::new(256, 16).unwrap();
        assert_eq!(config.ticks_per_block(), 4096);
    }

    #[test]
    fn staging_keeps_newest() {
        let (mut handle, mut staging) = staging();
        handle.stage(DispatchConfig::new(2, 8).unwrap()).unwrap();
        handle.stage(DispatchConfig::new(4, 32).unwrap()).unwrap();

        let latest = staging.latest().unwrap();
        assert_eq!(latest.frame_divider, 4);
        assert_eq!(latest.buffer_size, 32);
        assert!(staging.latest().is_none());
    }

    #[test]
    fn staging_rejects_invalid_before_queueing() {
        let (mut handle, mut staging) = staging();
        let bad = DispatchConfig::default().with_buffer_size(0);
        assert_eq!(handle.stage(bad), Err(ConfigurationError::ZeroBufferSize));
        assert!(staging.latest().is_none());
    }

    #[test]
    fn staging_reports_full_ring() {
        let (mut handle, _staging) = staging();
        for _ in 0..STAGING_CAPACITY {
            handle.stage(DispatchConfig::default()).unwrap();
        }
        assert_eq!(
            handle.stage(DispatchConfig::default()),
            Err(ConfigurationError::StagingFull)
        );
    }

    #[test]
    fn rejected_stage_can_be_retried_after_drain() {
        let (mut handle, mut staging) = staging();
        for _ in 0..STAGING_CAPACITY {
            handle.stage(DispatchConfig::default()).unwrap();
        }
        let wanted = DispatchConfig::new(8, 64).unwrap();
        assert_eq!(handle.stage(wanted), Err(ConfigurationError::StagingFull));

        // The boundary drain keeps the newest queued value, not the rejected one
        assert_eq!(staging.latest(), Some(DispatchConfig::default()));
        handle.stage(wanted).unwrap();
        assert_eq!(staging.latest(), Some(wanted));
    }
}
