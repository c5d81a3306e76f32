//! Domain types: call logs, reports and agent settings

pub mod call_log;
pub mod settings;

pub use call_log::{CallLog, CallReport, CallStatus, ReportStatus};
pub use settings::AgentSettings;
