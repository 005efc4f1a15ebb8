//! State Debouncer: raw per-frame booleans → edge-triggered events
//!
//! Per channel:
//! - fires = raw && armed; firing disarms and records the time
//! - EdgeReset: re-armed by any frame where raw is false
//! - TimeBased: re-armed once now - last_fired_at ≥ cooldown
//!
//! Time is injected by the caller (frame timestamps), so nothing here reads
//! a clock or spawns a timer. Each run may restart its clock: the first
//! sample after [`Debouncer::begin_run`] that is not later than a time-based
//! channel's last firing starts a new time base for that channel.

use tracing::debug;
use crate::types::{ChannelConfig, ChannelId, DebouncePolicy, PipelineConfig};

/// Arming record for one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceState {
    pub armed: bool,
    /// None until the channel has fired once
    pub last_fired_at: Option<f64>,
}

impl Default for DebounceState {
    fn default() -> Self {
        Self {
            armed: true,
            last_fired_at: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Channel {
    config: ChannelConfig,
    state: DebounceState,
    fire_count: u64,
    /// First sample of a run not yet seen
    run_started: bool,
}

impl Channel {
    fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            state: DebounceState::default(),
            fire_count: 0,
            run_started: false,
        }
    }

    fn observe(&mut self, raw: bool, now: f64) -> bool {
        if std::mem::take(&mut self.run_started) {
            self.rebase(now);
        }

        match self.config.policy {
            DebouncePolicy::EdgeReset => {
                if !raw {
                    self.state.armed = true;
                }
            }
            DebouncePolicy::TimeBased => {
                // A timestamp older than the last firing never re-arms
                if let Some(fired_at) = self.state.last_fired_at {
                    if now - fired_at >= self.config.cooldown_secs {
                        self.state.armed = true;
                    }
                }
            }
        }

        let fires = raw && self.state.armed;
        if fires {
            self.state.armed = false;
            self.state.last_fired_at = Some(now);
            self.fire_count += 1;
        }
        fires
    }

    /// Drop the last firing time when a new run's clock starts at or
    /// before it
    fn rebase(&mut self, now: f64) {
        if self.config.policy != DebouncePolicy::TimeBased {
            return;
        }
        if let Some(fired_at) = self.state.last_fired_at {
            if now <= fired_at {
                debug!(channel = %self.config.id, fired_at, now, "frame clock restarted, new time base");
                self.state = DebounceState::default();
            }
        }
    }
}

/// Owns every channel's debounce state for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    channels: Vec<Channel>,
}

impl Debouncer {
    /// Create with the given channels, all armed
    pub fn new(configs: &[ChannelConfig]) -> Self {
        let mut debouncer = Self::default();
        for config in configs {
            debouncer.register(*config);
        }
        debouncer
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.channels)
    }

    /// Add a channel, replacing any existing one with the same id
    pub fn register(&mut self, config: ChannelConfig) {
        match self.channels.iter_mut().find(|c| c.config.id == config.id) {
            Some(existing) => *existing = Channel::new(config),
            None => self.channels.push(Channel::new(config)),
        }
    }

    /// Feed one raw sample; true exactly when an event should be emitted.
    ///
    /// Unknown channels are registered on first use with the time-based
    /// policy and the default cooldown.
    pub fn observe(&mut self, id: ChannelId, raw: bool, now: f64) -> bool {
        let idx = match self.channels.iter().position(|c| c.config.id == id) {
            Some(idx) => idx,
            None => {
                debug!(channel = %id, "registering unconfigured channel as time-based");
                self.channels.push(Channel::new(ChannelConfig::time_based(id)));
                self.channels.len() - 1
            }
        };
        self.channels[idx].observe(raw, now)
    }

    /// Mark the start of a run; the next sample on each channel may start a
    /// new time base
    pub fn begin_run(&mut self) {
        for channel in &mut self.channels {
            channel.run_started = true;
        }
    }

    /// Channel configs in registration order
    pub fn channels(&self) -> impl Iterator<Item = &ChannelConfig> + '_ {
        self.channels.iter().map(|c| &c.config)
    }

    pub fn state(&self, id: ChannelId) -> Option<DebounceState> {
        self.find(id).map(|c| c.state)
    }

    pub fn fire_count(&self, id: ChannelId) -> u64 {
        self.find(id).map(|c| c.fire_count).unwrap_or(0)
    }

    /// Re-arm every channel and forget firing history
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.state = DebounceState::default();
            channel.fire_count = 0;
        }
    }

    fn find(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.config.id == id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FingerId;

    const CH: ChannelId = ChannelId::LeftHandPresent;

    fn single(policy: DebouncePolicy, cooldown: f64) -> Debouncer {
        Debouncer::new(&[ChannelConfig::new(CH, policy, cooldown)])
    }

    #[test]
    fn test_channels_start_armed() {
        let d = single(DebouncePolicy::TimeBased, 1.0);
        assert_eq!(d.state(CH), Some(DebounceState::default()));
        assert!(d.state(CH).unwrap().armed);
    }

    #[test]
    fn test_time_based_cooldown() {
        let mut d = single(DebouncePolicy::TimeBased, 1.0);
        assert!(d.observe(CH, true, 0.0));
        assert!(!d.observe(CH, true, 0.5));
        assert!(d.observe(CH, true, 1.1));
        assert_eq!(d.fire_count(CH), 2);
    }

    #[test]
    fn test_time_based_ignores_false_samples() {
        let mut d = single(DebouncePolicy::TimeBased, 1.0);
        assert!(d.observe(CH, true, 0.0));
        assert!(!d.observe(CH, false, 0.2));
        assert!(!d.observe(CH, true, 0.3));
    }

    #[test]
    fn test_time_based_exact_cooldown_rearms() {
        let mut d = single(DebouncePolicy::TimeBased, 1.0);
        assert!(d.observe(CH, true, 2.0));
        assert!(d.observe(CH, true, 3.0));
    }

    #[test]
    fn test_time_based_out_of_order_timestamp_does_not_fire() {
        let mut d = single(DebouncePolicy::TimeBased, 1.0);
        assert!(d.observe(CH, true, 5.0));
        assert!(!d.observe(CH, true, 3.0));
        assert_eq!(d.state(CH).unwrap().last_fired_at, Some(5.0));
    }

    #[test]
    fn test_edge_reset() {
        let mut d = single(DebouncePolicy::EdgeReset, 1.0);
        assert!(d.observe(CH, true, 0.0));
        assert!(!d.observe(CH, true, 0.1));
        assert!(!d.observe(CH, false, 0.2));
        assert!(d.state(CH).unwrap().armed);
        assert!(d.observe(CH, true, 0.3));
    }

    #[test]
    fn test_edge_reset_sustained_true_fires_once() {
        let mut d = single(DebouncePolicy::EdgeReset, 1.0);
        let fired = (0..50)
            .filter(|i| d.observe(CH, true, *i as f64 * 0.1))
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_channels_are_independent() {
        let index = ChannelId::FingerBent(FingerId::Index);
        let mut d = Debouncer::new(&[
            ChannelConfig::time_based(CH),
            ChannelConfig::edge_reset(index),
        ]);
        assert!(d.observe(CH, true, 0.0));
        assert!(d.observe(index, true, 0.0));
        assert!(!d.observe(CH, true, 0.1));
        assert!(!d.observe(index, true, 0.1));
    }

    #[test]
    fn test_unknown_channel_registers_time_based() {
        let mut d = Debouncer::default();
        let ring = ChannelId::FingerBent(FingerId::Ring);
        assert!(d.observe(ring, true, 0.0));
        assert!(!d.observe(ring, false, 0.1));
        assert!(!d.observe(ring, true, 0.2));
        assert_eq!(d.channels().count(), 1);
    }

    #[test]
    fn test_new_run_with_restarted_clock_rearms_time_based() {
        let mut d = single(DebouncePolicy::TimeBased, 1.0);
        assert!(d.observe(CH, true, 0.0));
        assert!(d.observe(CH, true, 59.0));

        d.begin_run();
        assert!(d.observe(CH, true, 0.0));
        assert!(!d.observe(CH, true, 0.5));
        assert!(d.observe(CH, true, 1.0));
        assert_eq!(d.fire_count(CH), 4);
    }

    #[test]
    fn test_new_run_with_continuing_clock_keeps_cooldown() {
        let mut d = single(DebouncePolicy::TimeBased, 1.0);
        assert!(d.observe(CH, true, 5.0));

        d.begin_run();
        assert!(!d.observe(CH, true, 5.5));
        assert!(d.observe(CH, true, 6.0));
    }

    #[test]
    fn test_out_of_order_within_run_not_rebased() {
        let mut d = single(DebouncePolicy::TimeBased, 1.0);
        d.begin_run();
        assert!(d.observe(CH, true, 5.0));
        assert!(!d.observe(CH, true, 3.0));
    }

    #[test]
    fn test_reset_rearms() {
        let mut d = single(DebouncePolicy::EdgeReset, 1.0);
        assert!(d.observe(CH, true, 0.0));
        d.reset();
        assert!(d.observe(CH, true, 0.0));
        assert_eq!(d.fire_count(CH), 1);
    }
}
