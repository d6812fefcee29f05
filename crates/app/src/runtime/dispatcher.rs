//! Call dispatcher: caps concurrent outbound calls and queues the overflow.
//!
//! The dispatcher is a plain state machine: it never performs IO or starts
//! timers itself. Callers act on what each method returns (start a call, arm
//! the drain timer, report a rejection).

use std::collections::VecDeque;
use std::fmt::Display;

use relaylogic_domain::error::CapacityError;
use relaylogic_domain::settings::{DispatchSettings, MAX_CONCURRENT_CALLS};

/// What the caller must do with a submitted call.
#[derive(Debug, PartialEq, Eq)]
pub enum Admission<C> {
    /// Start the call now.
    Dispatch(C),
    /// The call waits in the queue.
    Queued {
        /// `true` when no drain timer is running yet.
        arm_drain_timer: bool,
    },
}

/// The queue was full; the call is handed back untouched.
#[derive(Debug, PartialEq, Eq)]
pub struct Rejected<C> {
    pub error: CapacityError,
    pub call: C,
}

/// Result of one drain-timer tick.
#[derive(Debug, PartialEq, Eq)]
pub struct DrainTick<C> {
    /// At most one call to start.
    pub released: Option<C>,
    /// Whether the drain timer must fire again.
    pub rearm: bool,
}

/// Bounded FIFO in front of a fixed concurrency budget.
#[derive(Debug)]
pub struct CallDispatcher<C> {
    limit: usize,
    capacity: usize,
    active: usize,
    pending: VecDeque<C>,
    drain_armed: bool,
}

impl<C: Display> CallDispatcher<C> {
    /// The concurrency limit is clamped to [`MAX_CONCURRENT_CALLS`].
    #[must_use]
    pub fn new(settings: &DispatchSettings) -> Self {
        Self {
            limit: settings.concurrency_limit.clamp(1, MAX_CONCURRENT_CALLS),
            capacity: settings.queue_capacity,
            active: 0,
            pending: VecDeque::with_capacity(settings.queue_capacity),
            drain_armed: false,
        }
    }

    /// Admit `call`: dispatch it, queue it, or reject it.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected`] when both the concurrency budget and the queue
    /// are exhausted. The queue is left unchanged.
    pub fn submit(&mut self, call: C) -> Result<Admission<C>, Rejected<C>> {
        if self.active < self.limit {
            self.active += 1;
            return Ok(Admission::Dispatch(call));
        }
        if self.pending.len() < self.capacity {
            self.pending.push_back(call);
            let arm_drain_timer = !self.drain_armed;
            self.drain_armed = true;
            return Ok(Admission::Queued { arm_drain_timer });
        }
        Err(Rejected {
            error: CapacityError {
                call: call.to_string(),
            },
            call,
        })
    }

    /// Record the completion (success, failure or timeout) of an active call
    /// and release the next queued call, if any.
    pub fn complete(&mut self) -> Option<C> {
        self.active = self.active.saturating_sub(1);
        self.release_one()
    }

    /// Handle a drain-timer expiry.
    pub fn drain_tick(&mut self) -> DrainTick<C> {
        let released = self.release_one();
        self.drain_armed = !self.pending.is_empty();
        DrainTick {
            released,
            rearm: self.drain_armed,
        }
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn release_one(&mut self) -> Option<C> {
        if self.active >= self.limit {
            return None;
        }
        let call = self.pending.pop_front()?;
        self.active += 1;
        Some(call)
    }
}
