//! Dispatch state owned by the sequencer.

use crate::domain::CallStatus;

/// Where the sequencer is in a dispatch session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Host is working through the queue
    Dispatching,
    /// A call finished and its report has not been filed yet
    AwaitingReport { call_id: String },
    /// A DNC number slipped through; counting down before moving on
    DncSkipCountdown { number: String, remaining: u32 },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Dispatching => "dispatching",
            Phase::AwaitingReport { .. } => "awaiting-report",
            Phase::DncSkipCountdown { .. } => "dnc-skip-countdown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchState {
    pub phase: Phase,
    /// Filtered numbers the host has not reported on yet
    pub remaining_queue: Vec<String>,
    /// Set when dialing starts, cleared on every completion
    pub is_call_active: bool,
    pub last_completed: Option<(String, CallStatus)>,
    /// Numbers removed by the DNC filter when the session started
    pub skipped_dnc: usize,
}

impl DispatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Begin a session over the filtered queue.
    pub fn begin(&mut self, queue: Vec<String>, skipped: usize) {
        self.phase = Phase::Dispatching;
        self.remaining_queue = queue;
        self.skipped_dnc = skipped;
        self.last_completed = None;
    }

    /// Record a completion and drop the number from the remaining queue.
    pub fn complete(&mut self, number: &str, status: CallStatus) {
        self.is_call_active = false;
        self.last_completed = Some((number.to_string(), status));
        if let Some(pos) = self.remaining_queue.iter().position(|n| n == number) {
            self.remaining_queue.remove(pos);
        }
    }

    /// Move on after a call: back to dispatching, or idle when nothing is left.
    /// Returns true when the queue is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.remaining_queue.is_empty() {
            self.phase = Phase::Idle;
            true
        } else {
            self.phase = Phase::Dispatching;
            false
        }
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.is_call_active = false;
        self.remaining_queue.clear();
    }
}
