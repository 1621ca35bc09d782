//! Debounced presence-to-light state machine.
//!
//! `RoomState` is a plain value. Each frame the driver folds one presence
//! sample into it with [`RoomState::step`] and gets back the next state plus
//! at most one [`LightEvent`].
//!
//! - A detection turns the light on immediately and refreshes `last_seen`.
//! - The light turns off only once the time since `last_seen` is strictly
//!   greater than `off_delay`.

use std::fmt;
use std::time::{Duration, Instant};

/// Default debounce window.
pub const DEFAULT_OFF_DELAY: Duration = Duration::from_secs(5);

/// Light transition emitted by [`RoomState::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightEvent {
    On,
    Off,
}

impl LightEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            LightEvent::On => "ON",
            LightEvent::Off => "OFF",
        }
    }
}

impl fmt::Display for LightEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current light state.
///
/// Fields are private so that `is_on` can only become true through `step`,
/// which always records `last_seen` first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomState {
    is_on: bool,
    last_seen: Option<Instant>,
    off_delay: Duration,
}

impl RoomState {
    /// Light off, nothing seen yet.
    pub fn new(off_delay: Duration) -> Self {
        Self {
            is_on: false,
            last_seen: None,
            off_delay,
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn last_seen(&self) -> Option<Instant> {
        self.last_seen
    }

    pub fn off_delay(&self) -> Duration {
        self.off_delay
    }

    /// Fold one presence sample into the state.
    ///
    /// Never fails. If `now` is earlier than `last_seen` the elapsed time
    /// counts as zero.
    #[must_use]
    pub fn step(self, detected: bool, now: Instant) -> (RoomState, Option<LightEvent>) {
        if detected {
            let next = RoomState {
                is_on: true,
                last_seen: Some(now),
                off_delay: self.off_delay,
            };
            let event = (!self.is_on).then_some(LightEvent::On);
            return (next, event);
        }

        if self.is_on && self.absent_for(now) > self.off_delay {
            let next = RoomState {
                is_on: false,
                ..self
            };
            return (next, Some(LightEvent::Off));
        }

        (self, None)
    }

    /// Whole seconds left before the light turns off, rounded up.
    ///
    /// `None` while the light is off or a subject is in the current frame.
    pub fn countdown_secs(&self, detected: bool, now: Instant) -> Option<u64> {
        if !self.is_on || detected {
            return None;
        }
        let remaining = self.off_delay.saturating_sub(self.absent_for(now));
        Some(ceil_secs(remaining))
    }

    fn absent_for(&self, now: Instant) -> Duration {
        match self.last_seen {
            Some(seen) => now.saturating_duration_since(seen),
            None => Duration::ZERO,
        }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new(DEFAULT_OFF_DELAY)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
