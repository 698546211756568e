// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot timer scheduling.
//!
//! The engine never sleeps. Whenever it needs to act later it asks a
//! [`Scheduler`] for a one-shot timer identified by a [`TimerToken`], and the
//! host calls back into the coordinator when the timer expires.
//!
//! [`VirtualScheduler`] keeps timers in a deadline queue on a logical clock.
//! Tests drive it explicitly; hosts with an event loop can drive it from wall
//! time (see [`WallClock`] with the `std` feature).

use alloc::collections::BTreeMap;

use crate::types::{GestureId, PointerId, TargetId};

/// Handle of a scheduled timer. Used to cancel it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimerHandle(u64);

/// What a timer is for, and who owns it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimerToken {
    /// End of a target's acquisition window.
    Recognize(TargetId),
    /// End of a recognized gesture's completion grace period.
    Completion(TargetId),
    /// End of a repeat-count gesture's repeat window.
    Repeat(GestureId),
    /// Hover settle timeout for a pointer.
    HoverSettle(PointerId),
    /// Re-run recognition after a gesture ended with pointers still down.
    Recheck(TargetId),
}

/// Schedules one-shot timers.
pub trait Scheduler {
    /// Schedule `token` to fire `delay_ms` after `now`.
    ///
    /// A zero delay fires on the next turn, never synchronously.
    fn schedule_once(&mut self, now: u64, delay_ms: u64, token: TimerToken) -> TimerHandle;

    /// Cancel a timer. Cancelling an expired or unknown handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

/// A timer that has come due.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DueTimer {
    /// Handle returned when the timer was scheduled.
    pub handle: TimerHandle,
    /// Purpose and owner.
    pub token: TimerToken,
    /// Logical time at which it expired.
    pub deadline: u64,
}

/// Deterministic deadline queue on a logical millisecond clock.
///
/// Timers with equal deadlines fire in scheduling order.
#[derive(Clone, Debug, Default)]
pub struct VirtualScheduler {
    next_seq: u64,
    // (deadline, seq) -> token
    pending: BTreeMap<(u64, u64), TimerToken>,
    // seq -> deadline, for cancellation
    deadlines: BTreeMap<u64, u64>,
}

impl VirtualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers that have not fired or been cancelled.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Whether `handle` is still pending.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<DueTimer> {
        let (&(deadline, seq), _) = self.pending.iter().next()?;
        if deadline > now {
            return None;
        }
        let token = self.pending.remove(&(deadline, seq))?;
        self.deadlines.remove(&seq);
        Some(DueTimer {
            handle: TimerHandle(seq),
            token,
            deadline,
        })
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule_once(&mut self, now: u64, delay_ms: u64, token: TimerToken) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let deadline = now.saturating_add(delay_ms);
        self.pending.insert((deadline, seq), token);
        self.deadlines.insert(seq, deadline);
        TimerHandle(seq)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(deadline) = self.deadlines.remove(&handle.0) {
            self.pending.remove(&(deadline, handle.0));
        }
    }
}

/// Milliseconds elapsed since construction, for driving a [`VirtualScheduler`] from real time.
#[cfg(feature = "std")]
#[derive(Copy, Clone, Debug)]
pub struct WallClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl WallClock {
    /// Start a clock at zero.
    pub fn start() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }

    /// Milliseconds since [`WallClock::start`].
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(feature = "std")]
impl Default for WallClock {
    fn default() -> Self {
        Self::start()
    }
}
