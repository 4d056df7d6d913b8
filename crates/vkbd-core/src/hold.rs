#![forbid(unsafe_code)]

//! Press-and-hold repetition.
//!
//! # State Machine
//!
//! ```text
//!   Idle ──press──▶ InitialWait ──delay elapsed──▶ Repeating
//!    ▲                  │                              │
//!    └──release/leave/cancel──────────────────────────┘
//! ```
//!
//! [`HoldRepeat::press`] reports the immediate commit; every later commit
//! comes out of [`HoldRepeat::poll`]. The controller never holds an edit
//! function or field snapshot: the caller resolves and applies each firing
//! against the live field at fire time.
//!
//! # Timing
//!
//! A press held for `d` produces `1 + floor((d - initial_delay) / interval)`
//! commits once `d >= initial_delay + interval`, and exactly one commit
//! before that.
//!
//! # Invariants
//!
//! 1. At most one timer chain per key. Pressing a key with a live chain
//!    tears the old chain down first.
//! 2. Release, leave, and cancel all remove the chain, whichever phase it
//!    is in. No firing for a released key is ever returned.

use std::collections::HashMap;

use web_time::{Duration, Instant};

use crate::layout::KeyId;
use crate::timer::{CancelHandle, TimerEvent, TimerQueue};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default delay before repetition starts.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 250;

/// Default interval between repeats.
pub const DEFAULT_REPEAT_INTERVAL_MS: u64 = 50;

/// Minimum allowed initial delay.
pub const MIN_INITIAL_DELAY_MS: u64 = 0;

/// Maximum allowed initial delay.
pub const MAX_INITIAL_DELAY_MS: u64 = 2_000;

/// Minimum allowed repeat interval.
pub const MIN_REPEAT_INTERVAL_MS: u64 = 10;

/// Maximum allowed repeat interval.
pub const MAX_REPEAT_INTERVAL_MS: u64 = 1_000;

/// Environment variable overriding the initial delay (milliseconds).
pub const ENV_INITIAL_DELAY: &str = "VKBD_REPEAT_DELAY_INITIAL_MS";

/// Environment variable overriding the repeat interval (milliseconds).
pub const ENV_REPEAT_INTERVAL: &str = "VKBD_REPEAT_INTERVAL_MS";

/// Hold-repeat timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldConfig {
    /// Wait before the first repeat window opens (default: 250ms).
    pub initial_delay: Duration,
    /// Interval between repeats (default: 50ms).
    pub repeat_interval: Duration,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            repeat_interval: Duration::from_millis(DEFAULT_REPEAT_INTERVAL_MS),
        }
    }
}

impl HoldConfig {
    /// Set the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the repeat interval.
    #[must_use]
    pub fn with_repeat_interval(mut self, interval: Duration) -> Self {
        self.repeat_interval = interval;
        self
    }

    /// Defaults overridden by `VKBD_REPEAT_DELAY_INITIAL_MS` and
    /// `VKBD_REPEAT_INTERVAL_MS`, then validated.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup(ENV_INITIAL_DELAY)
            && let Ok(ms) = val.trim().parse::<u64>()
        {
            config.initial_delay = Duration::from_millis(ms);
        }
        if let Some(val) = lookup(ENV_REPEAT_INTERVAL)
            && let Ok(ms) = val.trim().parse::<u64>()
        {
            config.repeat_interval = Duration::from_millis(ms);
        }

        config.validated()
    }

    /// Clamp both durations into their allowed ranges.
    #[must_use]
    pub fn validated(mut self) -> Self {
        let delay_ms = self.initial_delay.as_millis().min(u128::from(u64::MAX)) as u64;
        let interval_ms = self.repeat_interval.as_millis().min(u128::from(u64::MAX)) as u64;
        self.initial_delay =
            Duration::from_millis(delay_ms.clamp(MIN_INITIAL_DELAY_MS, MAX_INITIAL_DELAY_MS));
        self.repeat_interval =
            Duration::from_millis(interval_ms.clamp(MIN_REPEAT_INTERVAL_MS, MAX_REPEAT_INTERVAL_MS));
        self
    }

    /// Whether both durations are already in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let delay_ms = self.initial_delay.as_millis();
        let interval_ms = self.repeat_interval.as_millis();
        (u128::from(MIN_INITIAL_DELAY_MS)..=u128::from(MAX_INITIAL_DELAY_MS)).contains(&delay_ms)
            && (u128::from(MIN_REPEAT_INTERVAL_MS)..=u128::from(MAX_REPEAT_INTERVAL_MS))
                .contains(&interval_ms)
    }

    /// Commits produced by a press held for `held`.
    #[must_use]
    pub fn expected_commits(&self, held: Duration) -> u64 {
        match held.checked_sub(self.initial_delay) {
            Some(rest) => {
                let step = self.repeat_interval.as_nanos().max(1);
                1 + (rest.as_nanos() / step) as u64
            }
            None => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Where a key sits in its hold lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HoldPhase {
    /// Not pressed, or released.
    #[default]
    Idle,
    /// Pressed, initial delay still running.
    InitialWait,
    /// Pressed past the initial delay.
    Repeating,
}

/// Result of [`HoldRepeat::press`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressOutcome {
    /// The caller must commit the key's edit once, now.
    pub fire_now: bool,
    /// A live chain for the same key was torn down first.
    pub replaced_previous: bool,
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    handle: CancelHandle,
    phase: HoldPhase,
    started: Instant,
}

/// Tracks every held key and its timer chain.
#[derive(Debug)]
pub struct HoldRepeat {
    config: HoldConfig,
    timers: TimerQueue,
    holds: HashMap<KeyId, Hold>,
    owners: HashMap<CancelHandle, KeyId>,
}

impl HoldRepeat {
    /// Create an idle controller.
    #[must_use]
    pub fn new(config: HoldConfig) -> Self {
        Self {
            config,
            timers: TimerQueue::new(),
            holds: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Active timing.
    #[must_use]
    #[inline]
    pub fn config(&self) -> &HoldConfig {
        &self.config
    }

    /// Begin a hold on `key`. The caller commits once immediately.
    pub fn press(&mut self, key: &KeyId, now: Instant) -> PressOutcome {
        let replaced_previous = self.teardown(key);
        let handle = self
            .timers
            .start_repeating(self.config.initial_delay, self.config.repeat_interval, now);
        self.holds.insert(
            key.clone(),
            Hold {
                handle,
                phase: HoldPhase::InitialWait,
                started: now,
            },
        );
        self.owners.insert(handle, key.clone());

        #[cfg(feature = "tracing")]
        tracing::debug!(key = key.as_str(), handle = handle.id(), replaced_previous, "hold start");

        PressOutcome {
            fire_now: true,
            replaced_previous,
        }
    }

    /// End the hold on `key` (release, leave, or cancel). Returns whether a
    /// hold was active.
    pub fn release(&mut self, key: &KeyId, now: Instant) -> bool {
        #[cfg(feature = "tracing")]
        if let Some(hold) = self.holds.get(key) {
            tracing::debug!(
                key = key.as_str(),
                held_ms = now.saturating_duration_since(hold.started).as_millis() as u64,
                phase = ?hold.phase,
                "hold end"
            );
        }
        #[cfg(not(feature = "tracing"))]
        let _ = now;

        self.teardown(key)
    }

    /// Keys to commit for every firing due at or before `now`, oldest first.
    /// A key appears once per firing.
    pub fn poll(&mut self, now: Instant) -> Vec<KeyId> {
        let mut fired = Vec::new();
        while let Some(ev) = self.timers.pop_due(now) {
            let Some(key) = self.owners.get(&ev.handle()) else {
                continue;
            };
            match ev {
                TimerEvent::DelayElapsed { .. } => {
                    if let Some(hold) = self.holds.get_mut(key) {
                        hold.phase = HoldPhase::Repeating;
                    }
                }
                TimerEvent::Tick { .. } => fired.push(key.clone()),
            }
        }
        fired
    }

    /// Phase of `key`.
    #[must_use]
    pub fn phase(&self, key: &KeyId) -> HoldPhase {
        self.holds.get(key).map_or(HoldPhase::Idle, |h| h.phase)
    }

    /// When the hold on `key` started.
    #[must_use]
    pub fn held_since(&self, key: &KeyId) -> Option<Instant> {
        self.holds.get(key).map(|h| h.started)
    }

    /// Number of live timer chains.
    #[must_use]
    #[inline]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest time a firing is due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Keys currently held.
    pub fn held_keys(&self) -> impl Iterator<Item = &KeyId> {
        self.holds.keys()
    }

    /// Tear down every hold.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
        self.holds.clear();
        self.owners.clear();
    }

    fn teardown(&mut self, key: &KeyId) -> bool {
        let Some(hold) = self.holds.remove(key) else {
            return false;
        };
        self.owners.remove(&hold.handle);
        self.timers.cancel(hold.handle);
        true
    }
}

impl Default for HoldRepeat {
    fn default() -> Self {
        Self::new(HoldConfig::default())
    }
}
