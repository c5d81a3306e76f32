//! Daily call statistics, overall and per working-hour range.

use chrono::{NaiveDate, Timelike};
use serde::Serialize;

use crate::domain::{CallLog, CallStatus};

/// Working-hour ranges as (label, start hour inclusive, end hour exclusive)
pub const HOUR_RANGES: [(&str, u32, u32); 4] = [
    ("9am - 11am", 9, 11),
    ("11am - 2pm", 11, 14),
    ("2pm - 4pm", 14, 16),
    ("4pm - 6pm", 16, 18),
];

/// Canonical label for a typed range name; spacing and case are ignored
pub fn find_range(label: &str) -> Option<&'static str> {
    let squash = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();
    let wanted = squash(label);
    HOUR_RANGES
        .iter()
        .map(|(name, _, _)| *name)
        .find(|name| squash(name) == wanted)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeStats {
    pub label: String,
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub answered: usize,
    pub unanswered: usize,
    pub busy: usize,
    pub total: usize,
    pub ranges: Vec<RangeStats>,
}

impl DailyStats {
    /// Tally the logs whose local date is `day`
    pub fn for_day(logs: &[CallLog], day: NaiveDate) -> Self {
        let todays: Vec<&CallLog> = logs.iter().filter(|l| l.local_time().date_naive() == day).collect();
        let count = |status: CallStatus, logs: &[&CallLog]| logs.iter().filter(|l| l.status == status).count();

        let ranges = HOUR_RANGES
            .iter()
            .map(|(label, start, end)| {
                let in_range: Vec<&CallLog> = todays
                    .iter()
                    .copied()
                    .filter(|l| {
                        let hour = l.local_time().hour();
                        hour >= *start && hour < *end
                    })
                    .collect();
                RangeStats {
                    label: label.to_string(),
                    total: in_range.len(),
                    answered: count(CallStatus::Answered, &in_range),
                    unanswered: count(CallStatus::Unanswered, &in_range),
                }
            })
            .collect();

        Self {
            answered: count(CallStatus::Answered, &todays),
            unanswered: count(CallStatus::Unanswered, &todays),
            busy: count(CallStatus::Busy, &todays),
            total: todays.len(),
            ranges,
        }
    }
}
