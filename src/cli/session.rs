//! Line commands accepted on stdin during a `dial` session.
//!
//! ```text
//! report [qualified=yes] [outbound=no] [inbound=yes] [status=callback] [series=S-1]
//! edit <call-id> [same fields as report]
//! stop
//! quit
//! ```

use autodial::domain::{CallReport, ReportStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Report(ReportFields),
    Edit { call_id: String, fields: ReportFields },
    Stop,
    Quit,
    Help,
}

/// Report form values typed by the agent; unset fields keep the form defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFields {
    pub qualified: Option<bool>,
    pub texts_outbound: Option<bool>,
    pub text_inbound: Option<bool>,
    pub status: Option<ReportStatus>,
    pub series: Option<String>,
}

impl ReportFields {
    pub fn into_report(self, default_series: &str) -> CallReport {
        let mut report = CallReport::new(self.series.unwrap_or_else(|| default_series.to_string()));
        if let Some(v) = self.qualified {
            report.qualified = v;
        }
        if let Some(v) = self.texts_outbound {
            report.texts_outbound = v;
        }
        if let Some(v) = self.text_inbound {
            report.text_inbound = if v { "YES" } else { "NO" }.to_string();
        }
        if let Some(v) = self.status {
            report.status = v;
        }
        report
    }
}

/// Parse one stdin line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "report" | "r" => SessionCommand::Report(parse_fields(words)?),
        "edit" => {
            let call_id = words.next().ok_or("edit needs a call id")?.to_string();
            SessionCommand::Edit {
                call_id,
                fields: parse_fields(words)?,
            }
        }
        "stop" => SessionCommand::Stop,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        "help" | "?" => SessionCommand::Help,
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(command))
}

fn parse_fields<'a>(words: impl Iterator<Item = &'a str>) -> Result<ReportFields, String> {
    let mut fields = ReportFields::default();
    for word in words {
        let (key, value) = word
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {}", word))?;
        match key.to_ascii_lowercase().as_str() {
            "qualified" | "q" => fields.qualified = Some(parse_yes_no(value)?),
            "outbound" | "out" => fields.texts_outbound = Some(parse_yes_no(value)?),
            "inbound" | "in" => fields.text_inbound = Some(parse_yes_no(value)?),
            "status" | "s" => fields.status = Some(value.parse::<ReportStatus>().map_err(|e| e.to_string())?),
            "series" => fields.series = Some(value.to_string()),
            other => return Err(format!("unknown field: {}", other)),
        }
    }
    Ok(fields)
}

fn parse_yes_no(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        other => Err(format!("expected yes/no, got {}", other)),
    }
}
