//! Outbound notices from the sequencer to whatever is showing them.

use std::io::Write;

use colored::Colorize;

use crate::domain::{CallLog, CallStatus};

/// Something the agent should see
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Short-lived status line
    Toast(String),
    /// Must be acknowledged before dialing continues
    Error(String),
    /// Success or progress message from the host
    Info(String),
    DialStarted { count: usize, skipped: usize },
    /// DNC number skipped; `remaining` seconds until the next call
    DncSkip { number: String, remaining: u32 },
    /// Host post-call countdown
    HostCountdown { seconds: i64 },
    /// A call finished and needs its follow-up report
    ReportRequested { log: CallLog },
    ReportFiled { log: CallLog },
    QueueFinished,
    Stopped,
}

/// Receiver of sequencer notices.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Prints notices to the terminal.
pub struct ConsoleSink;

impl NoticeSink for ConsoleSink {
    fn notify(&self, notice: Notice) {
        let line = match notice {
            Notice::Toast(msg) => format!("{} {}", "•".dimmed(), msg),
            Notice::Error(msg) => format!("{} {}", "Error:".red().bold(), msg),
            Notice::Info(msg) => format!("{} {}", "✓".green(), msg),
            Notice::DialStarted { count, skipped } if skipped > 0 => format!(
                "{} Starting with {} numbers ({} in DNC)",
                "▶".cyan(),
                count,
                skipped
            ),
            Notice::DialStarted { count, .. } => {
                format!("{} Starting auto-dial of {} numbers", "▶".cyan(), count)
            }
            Notice::DncSkip { number, remaining } => format!(
                "{} {} is on the DNC list, skipping in {}s",
                "⊘".yellow(),
                number.yellow(),
                remaining
            ),
            Notice::HostCountdown { seconds } => format!("{} Next call in {}s", "…".dimmed(), seconds),
            Notice::ReportRequested { log } => format!(
                "{} {} {}  {}",
                "☎".cyan(),
                log.number.bold(),
                status_label(&log),
                "report: report [qualified=yes] [outbound=yes] [inbound=yes] [status=callback] [series=S]"
                    .dimmed()
            ),
            Notice::ReportFiled { log } => format!("{} Report filed for {}", "✓".green(), log.number),
            Notice::QueueFinished => format!("{} Queue finished", "■".cyan()),
            Notice::Stopped => format!("{} Dialing stopped", "■".yellow()),
        };

        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
    }
}

fn status_label(log: &CallLog) -> colored::ColoredString {
    match log.status {
        CallStatus::Answered => log.status.as_str().green(),
        CallStatus::Unanswered => log.status.as_str().yellow(),
        CallStatus::Busy => log.status.as_str().red(),
    }
}
