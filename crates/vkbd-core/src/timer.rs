#![forbid(unsafe_code)]

//! Deterministic, cancellable repeating timers.
//!
//! A [`TimerQueue`] holds timer chains of the form "wait `initial_delay`,
//! then tick every `interval`". Nothing runs in the background: the owner
//! calls [`TimerQueue::poll`] with the current time and receives every
//! firing that came due since the last poll, in chronological order.
//!
//! # Invariants
//!
//! 1. A cancelled chain never fires again, even if it was already overdue.
//! 2. [`TimerQueue::cancel`] is idempotent; cancelling an unknown or dead
//!    handle is a no-op that returns `false`.
//! 3. Firings from different chains are ordered by due time, ties broken by
//!    chain start order.
//! 4. Intervals are at least [`MIN_INTERVAL`], so a poll always terminates.

use std::collections::BTreeMap;

use web_time::{Duration, Instant};

/// Smallest interval a chain will tick at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a timer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancelHandle(u64);

impl CancelHandle {
    /// Raw id, for logs.
    #[must_use]
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A firing returned by [`TimerQueue::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The initial delay elapsed; ticking starts one interval later.
    DelayElapsed {
        /// Chain that fired.
        handle: CancelHandle,
        /// Scheduled time of the firing.
        at: Instant,
    },
    /// One interval tick.
    Tick {
        /// Chain that fired.
        handle: CancelHandle,
        /// Scheduled time of the firing.
        at: Instant,
    },
}

impl TimerEvent {
    /// Chain that produced the event.
    #[must_use]
    #[inline]
    pub const fn handle(&self) -> CancelHandle {
        match *self {
            Self::DelayElapsed { handle, .. } | Self::Tick { handle, .. } => handle,
        }
    }

    /// Scheduled time of the event.
    #[must_use]
    #[inline]
    pub const fn at(&self) -> Instant {
        match *self {
            Self::DelayElapsed { at, .. } | Self::Tick { at, .. } => at,
        }
    }
}

#[derive(Debug, Clone)]
struct Chain {
    next_due: Instant,
    interval: Duration,
    waiting: bool,
}

/// A set of live timer chains driven by explicit time.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    chains: BTreeMap<u64, Chain>,
}

impl TimerQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a chain: one `DelayElapsed` at `now + initial_delay`, then a
    /// `Tick` every `interval` after that until cancelled.
    pub fn start_repeating(&mut self, initial_delay: Duration, interval: Duration, now: Instant) -> CancelHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.chains.insert(
            id,
            Chain {
                next_due: now + initial_delay,
                interval: interval.max(MIN_INTERVAL),
                waiting: true,
            },
        );

        #[cfg(feature = "tracing")]
        tracing::trace!(
            handle = id,
            initial_delay_ms = initial_delay.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
            "timer chain started"
        );

        CancelHandle(id)
    }

    /// Cancel a chain. Returns whether it was live.
    pub fn cancel(&mut self, handle: CancelHandle) -> bool {
        let was_live = self.chains.remove(&handle.0).is_some();

        #[cfg(feature = "tracing")]
        if was_live {
            tracing::trace!(handle = handle.0, "timer chain cancelled");
        }

        was_live
    }

    /// Whether `handle` still refers to a live chain.
    #[must_use]
    #[inline]
    pub fn is_live(&self, handle: CancelHandle) -> bool {
        self.chains.contains_key(&handle.0)
    }

    /// Number of live chains.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether no chain is live.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Earliest pending due time.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.chains.values().map(|c| c.next_due).min()
    }

    /// Cancel every chain.
    pub fn clear(&mut self) {
        self.chains.clear();
    }

    /// Pop the single earliest firing due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerEvent> {
        let (&id, _) = self
            .chains
            .iter()
            .filter(|(_, c)| c.next_due <= now)
            .min_by_key(|(id, c)| (c.next_due, **id))?;
        let chain = self.chains.get_mut(&id)?;
        let at = chain.next_due;
        let handle = CancelHandle(id);
        chain.next_due = at + chain.interval;
        if chain.waiting {
            chain.waiting = false;
            Some(TimerEvent::DelayElapsed { handle, at })
        } else {
            Some(TimerEvent::Tick { handle, at })
        }
    }

    /// Drain every firing due at or before `now`, oldest first.
    pub fn poll(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut out = Vec::new();
        while let Some(ev) = self.pop_due(now) {
            out.push(ev);
        }
        out
    }
}
