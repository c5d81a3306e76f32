//! Autodial - auto-dialer control panel core
//!
//! Builds dial queues, screens them against a do-not-call list, hands them to
//! a host dialer one session at a time, and turns each completed call into a
//! call log, an optional follow-up SMS and an uploaded CSV report.

pub mod bridge;
pub mod dnc;
pub mod domain;
pub mod error;
pub mod id;
pub mod queue;
pub mod report;
pub mod sequencer;
pub mod sms;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use error::{DialerError, Result};
