//! Call reports: CSV rows, filenames, upload and daily statistics

pub mod csv;
pub mod stats;
pub mod upload;

use chrono::{DateTime, Local};

use crate::domain::{CallLog, CallReport};
use crate::error::{DialerError, Result};

pub use self::csv::{build_csv, parse_csv};
pub use stats::{DailyStats, RangeStats, find_range};
pub use upload::{HttpUploader, ReportUploader};

/// Fixed header row of every uploaded report
pub const REPORT_HEADER: [&str; 11] = [
    "Date",
    "Time Log",
    "Phone Number",
    "Agent Name",
    "Calls",
    "Responses",
    "Texts (Outbound)",
    "Texts (Inbound)",
    "Qualified",
    "Status",
    "Series",
];

/// One data row under [`REPORT_HEADER`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub date: String,
    pub time: String,
    pub phone_number: String,
    pub agent_name: String,
    pub calls: String,
    pub responses: String,
    pub texts_outbound: String,
    pub texts_inbound: String,
    pub qualified: String,
    pub status: String,
    pub series: String,
}

impl ReportRow {
    /// Row for a report the agent just submitted about `number`
    pub fn from_report(number: &str, agent_name: &str, report: &CallReport, now: DateTime<Local>) -> Self {
        Self {
            date: format_date(now),
            time: format_time(now),
            phone_number: number.to_string(),
            agent_name: agent_name.to_string(),
            calls: String::new(),
            responses: String::new(),
            texts_outbound: yes_no(report.texts_outbound).to_string(),
            texts_inbound: if report.text_inbound.is_empty() {
                "No".to_string()
            } else {
                report.text_inbound.clone()
            },
            qualified: yes_no(report.qualified).to_string(),
            status: report.status.to_string(),
            series: report.series.clone(),
        }
    }

    /// Row for a stored log in an export of all activity
    pub fn from_log(log: &CallLog, agent_name: &str, export_day: DateTime<Local>) -> Self {
        Self {
            date: format_date(export_day),
            time: format_time(log.local_time()),
            phone_number: log.number.clone(),
            agent_name: agent_name.to_string(),
            calls: String::new(),
            responses: String::new(),
            texts_outbound: log.texts_outbound.map(yes_no).unwrap_or_default().to_string(),
            texts_inbound: log.text_inbound.clone().unwrap_or_default(),
            qualified: log.qualified.map(yes_no).unwrap_or_default().to_string(),
            status: match log.report_status {
                Some(status) => status.to_string(),
                None => log.status.to_string(),
            },
            series: log.series.clone().unwrap_or_default(),
        }
    }

    pub fn fields(&self) -> [&str; 11] {
        [
            self.date.as_str(),
            self.time.as_str(),
            self.phone_number.as_str(),
            self.agent_name.as_str(),
            self.calls.as_str(),
            self.responses.as_str(),
            self.texts_outbound.as_str(),
            self.texts_inbound.as_str(),
            self.qualified.as_str(),
            self.status.as_str(),
            self.series.as_str(),
        ]
    }
}

/// Header plus `rows`, encoded as CSV
pub fn build_report_csv(rows: &[ReportRow]) -> Result<String> {
    let mut table: Vec<[&str; 11]> = Vec::with_capacity(rows.len() + 1);
    table.push(REPORT_HEADER);
    table.extend(rows.iter().map(ReportRow::fields));
    build_csv(table)
}

/// Upload a one-row report the agent filled in for a working-hour range.
///
/// Goes under the same daily filename as per-call reports. Returns that
/// filename.
pub async fn file_range_report(
    uploader: &dyn ReportUploader,
    range: &str,
    number: &str,
    agent_name: &str,
    report: &CallReport,
    now: DateTime<Local>,
) -> Result<String> {
    let label = find_range(range).ok_or_else(|| DialerError::Validation(format!("unknown hour range: {}", range)))?;
    let number = number.trim();
    if number.is_empty() {
        return Err(DialerError::Validation("phone number is required".to_string()));
    }

    let row = ReportRow::from_report(number, agent_name, report, now);
    let csv = build_report_csv(&[row])?;
    let filename = report_filename(agent_name, now);
    log::info!("Filing {} report for {} as {}", label, number, filename);
    uploader.upload(&filename, &csv).await?;
    Ok(filename)
}

/// `"{agent} - {M/D/YYYY}.csv"`, with "Agent" when no name is set
pub fn report_filename(agent_name: &str, day: DateTime<Local>) -> String {
    let agent = if agent_name.trim().is_empty() { "Agent" } else { agent_name };
    format!("{} - {}.csv", agent, format_date(day))
}

/// Locale-style short date, e.g. `3/7/2026`
pub fn format_date(at: DateTime<Local>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

/// Locale-style time, e.g. `2:05:09 PM`
pub fn format_time(at: DateTime<Local>) -> String {
    at.format("%-I:%M:%S %p").to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}
