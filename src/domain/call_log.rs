//! Call log record and related types
//!
//! A CallLog is created when the dialer reports a completed call and is
//! filled in later when the agent submits the follow-up report.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DialerError;
use crate::id::generate_call_id;

/// Outcome the host reports for a placed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallStatus {
    Busy,
    Answered,
    Unanswered,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Busy => "BUSY",
            CallStatus::Answered => "ANSWERED",
            CallStatus::Unanswered => "UNANSWERED",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = DialerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUSY" => Ok(CallStatus::Busy),
            "ANSWERED" => Ok(CallStatus::Answered),
            "UNANSWERED" => Ok(CallStatus::Unanswered),
            other => Err(DialerError::Validation(format!("unknown call status: {}", other))),
        }
    }
}

/// Disposition the agent picks in the follow-up report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportStatus {
    #[default]
    #[serde(rename = "UNDECIDED")]
    Undecided,
    #[serde(rename = "CALLBACK")]
    Callback,
    #[serde(rename = "NOT INTERESTED")]
    NotInterested,
    #[serde(rename = "DOCUMENTS SENT")]
    DocumentsSent,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Undecided => "UNDECIDED",
            ReportStatus::Callback => "CALLBACK",
            ReportStatus::NotInterested => "NOT INTERESTED",
            ReportStatus::DocumentsSent => "DOCUMENTS SENT",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = DialerError;

    /// Accepts the display form as well as `_`/`-` separated variants
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "UNDECIDED" => Ok(ReportStatus::Undecided),
            "CALLBACK" => Ok(ReportStatus::Callback),
            "NOT INTERESTED" => Ok(ReportStatus::NotInterested),
            "DOCUMENTS SENT" => Ok(ReportStatus::DocumentsSent),
            other => Err(DialerError::Validation(format!("unknown report status: {}", other))),
        }
    }
}

/// Follow-up form payload submitted after a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    pub qualified: bool,
    pub texts_outbound: bool,
    /// "YES" or "NO"
    pub text_inbound: String,
    pub status: ReportStatus,
    pub series: String,
}

impl CallReport {
    /// Blank report with the form's initial values
    pub fn new(series: impl Into<String>) -> Self {
        Self {
            qualified: false,
            texts_outbound: false,
            text_inbound: "NO".to_string(),
            status: ReportStatus::Undecided,
            series: series.into(),
        }
    }
}

/// One placed call attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    pub id: String,
    pub number: String,
    /// "MM:SS"
    pub duration: String,
    pub status: CallStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_status: Option<ReportStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texts_outbound: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_inbound: Option<String>,
}

impl CallLog {
    /// Log for a call the host just finished, before any report is filed
    pub fn completed(number: &str, status: CallStatus) -> Self {
        Self {
            id: generate_call_id(),
            number: number.to_string(),
            duration: "00:00".to_string(),
            status,
            timestamp: Utc::now(),
            qualified: None,
            report_status: None,
            series: None,
            texts_outbound: None,
            text_inbound: None,
        }
    }

    /// Merge a submitted report into this log
    pub fn apply_report(&mut self, report: &CallReport) {
        self.qualified = Some(report.qualified);
        self.report_status = Some(report.status);
        self.series = Some(report.series.clone());
        self.texts_outbound = Some(report.texts_outbound);
        self.text_inbound = Some(report.text_inbound.clone());
    }

    /// Whether a report has been filed for this call
    pub fn is_reported(&self) -> bool {
        self.report_status.is_some()
    }

    /// Timestamp in the agent's timezone
    pub fn local_time(&self) -> DateTime<Local> {
        self.timestamp.with_timezone(&Local)
    }
}
