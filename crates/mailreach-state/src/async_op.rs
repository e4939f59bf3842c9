//! Async operation tracking
//!
//! Every tracked operation moves through `Pending` and then settles as
//! `Fulfilled` or `Rejected`. [`AsyncOp::begin`] hands out a [`Ticket`] that
//! is consumed when the operation settles, so a dispatch can neither skip
//! `Pending` nor settle twice.

use tracing::debug;

/// Last observed state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpStatus {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// How overlapping dispatches of one operation are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    /// Only the most recent dispatch may settle; older results are dropped
    LatestOnly,
    /// Every dispatch settles; loading while any is in flight
    Concurrent,
}

/// Proof that an operation was started. Consumed by `fulfill`/`reject`.
#[derive(Debug)]
#[must_use = "a ticket must be settled with fulfill or reject"]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Loading flag, error and generation counter of one async operation
#[derive(Debug, Clone)]
pub struct AsyncOp {
    mode: OpMode,
    status: OpStatus,
    error: Option<String>,
    in_flight: u32,
    generation: u64,
}

impl AsyncOp {
    pub fn new(mode: OpMode) -> Self {
        Self {
            mode,
            status: OpStatus::Idle,
            error: None,
            in_flight: 0,
            generation: 0,
        }
    }

    /// Operation whose newest dispatch supersedes older ones (fetches)
    pub fn latest_only() -> Self {
        Self::new(OpMode::LatestOnly)
    }

    /// Operation whose dispatches all apply (mutations)
    pub fn concurrent() -> Self {
        Self::new(OpMode::Concurrent)
    }

    /// Enter `Pending`: set loading, clear the previous error
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.in_flight += 1;
        self.status = OpStatus::Pending;
        self.error = None;
        Ticket {
            generation: self.generation,
        }
    }

    /// Supersede every ticket handed out so far. A latest-only operation that
    /// was pending returns to `Idle`; its in-flight results will be dropped.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if self.mode == OpMode::LatestOnly && self.status == OpStatus::Pending {
            self.status = OpStatus::Idle;
        }
    }

    /// Whether a result carried by `ticket` may still be applied
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        match self.mode {
            OpMode::Concurrent => true,
            OpMode::LatestOnly => ticket.generation == self.generation,
        }
    }

    /// Settle as fulfilled. Returns false when the ticket was superseded and
    /// its result must be discarded.
    pub fn fulfill(&mut self, ticket: Ticket) -> bool {
        self.settle(ticket, OpStatus::Fulfilled, None)
    }

    /// Settle as rejected, keeping `message`. Returns false when superseded.
    pub fn reject(&mut self, ticket: Ticket, message: impl Into<String>) -> bool {
        self.settle(ticket, OpStatus::Rejected, Some(message.into()))
    }

    fn settle(&mut self, ticket: Ticket, status: OpStatus, error: Option<String>) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if !self.is_current(&ticket) {
            debug!(
                "Discarding stale result (generation {} < {})",
                ticket.generation, self.generation
            );
            return false;
        }

        self.status = status;
        self.error = error;
        true
    }

    pub fn status(&self) -> OpStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        match self.mode {
            OpMode::LatestOnly => self.status == OpStatus::Pending,
            OpMode::Concurrent => self.in_flight > 0,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// Dismiss the stored error, e.g. after a toast was shown
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
