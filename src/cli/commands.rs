//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - queue: print a generated dial queue
//! - dial: run a dispatch session
//! - dnc: refresh/inspect the DNC list
//! - settings: show or change agent settings
//! - stats, export: today's numbers and the full CSV export
//! - report: a report typed in for a working-hour range

use autodial::domain::ReportStatus;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::session::ReportFields;

/// Autodial - auto-dialer control panel
#[derive(Parser, Debug)]
#[command(name = "autodial")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Numbers to dial
#[derive(Args, Debug, Clone)]
pub struct QueueArgs {
    /// Base number prefix (usually 7 digits)
    #[arg(short, long)]
    pub base: String,

    /// Starting last-4 offset; non-digits are stripped
    #[arg(short, long, default_value = "")]
    pub last4: String,

    /// How many numbers to generate (clamped to 0..=10000)
    #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
    pub attempts: i64,

    /// Shuffle the queue before dialing
    #[arg(short, long)]
    pub shuffle: bool,
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the generated queue
    Queue {
        #[command(flatten)]
        queue: QueueArgs,
    },

    /// Run a dialing session; stdin drives reports and stop
    Dial {
        #[command(flatten)]
        queue: QueueArgs,

        /// Seconds between calls (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Use the built-in simulated host instead of the bridge
        #[arg(long)]
        simulate: bool,
    },

    /// DNC list management
    Dnc {
        #[command(subcommand)]
        command: DncCommands,
    },

    /// Agent settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Today's call statistics
    Stats,

    /// Export all call logs as CSV
    Export {
        /// Write to this file instead of uploading
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a report for a working-hour range
    Report(RangeReportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RangeReportArgs {
    /// Hour range label, e.g. "9am - 11am"
    #[arg(short, long)]
    pub range: String,

    /// Phone number the report is about
    #[arg(short, long)]
    pub number: String,

    #[arg(long)]
    pub qualified: bool,

    /// Texts were sent to the contact
    #[arg(long)]
    pub outbound: bool,

    /// The contact texted back
    #[arg(long)]
    pub inbound: bool,

    /// undecided, callback, not-interested or documents-sent
    #[arg(long)]
    pub status: Option<ReportStatus>,

    #[arg(long)]
    pub series: Option<String>,
}

impl RangeReportArgs {
    pub fn fields(&self) -> ReportFields {
        ReportFields {
            qualified: Some(self.qualified),
            texts_outbound: Some(self.outbound),
            text_inbound: Some(self.inbound),
            status: self.status,
            series: self.series.clone(),
        }
    }
}

/// DNC subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DncCommands {
    /// Refetch the list and replace the cache
    Refresh,

    /// Show cache state
    Status,

    /// Drop the cache so the next session refetches
    Clear,

    /// Check whether a number matches the list
    Check {
        /// Number to check
        number: String,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommands {
    /// Print current settings
    Show,

    /// Change settings; unspecified fields are kept
    Set(SettingsUpdate),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SettingsUpdate {
    #[arg(long)]
    pub agent: Option<String>,

    #[arg(long)]
    pub branch: Option<String>,

    #[arg(long)]
    pub series: Option<String>,

    #[arg(long)]
    pub sheet_id: Option<String>,

    /// Template sent after answered calls
    #[arg(long)]
    pub sms_answered: Option<String>,

    /// Template sent after unanswered calls
    #[arg(long)]
    pub sms_unanswered: Option<String>,

    /// Auto-SMS after unanswered calls
    #[arg(long)]
    pub auto_sms: Option<bool>,

    /// Auto-SMS after answered calls
    #[arg(long)]
    pub auto_sms_answered: Option<bool>,

    #[arg(long)]
    pub admin_phone: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.agent.is_none()
            && self.branch.is_none()
            && self.series.is_none()
            && self.sheet_id.is_none()
            && self.sms_answered.is_none()
            && self.sms_unanswered.is_none()
            && self.auto_sms.is_none()
            && self.auto_sms_answered.is_none()
            && self.admin_phone.is_none()
    }

    pub fn apply(&self, settings: &mut autodial::domain::AgentSettings) {
        if let Some(v) = &self.agent {
            settings.agent_name = v.clone();
        }
        if let Some(v) = &self.branch {
            settings.branch_name = v.clone();
        }
        if let Some(v) = &self.series {
            settings.series = Some(v.clone());
        }
        if let Some(v) = &self.sheet_id {
            settings.google_sheet_id = Some(v.clone());
        }
        if let Some(v) = &self.sms_answered {
            settings.sms_template_answered = v.clone();
        }
        if let Some(v) = &self.sms_unanswered {
            settings.sms_template_unanswered = v.clone();
        }
        if let Some(v) = self.auto_sms {
            settings.auto_sms_enabled = v;
        }
        if let Some(v) = self.auto_sms_answered {
            settings.auto_sms_answered_enabled = v;
        }
        if let Some(v) = &self.admin_phone {
            settings.admin_phone = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodial::domain::AgentSettings;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["autodial"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["autodial", "-v", "stats"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["autodial", "stats", "-c", "/path/to/autodial.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/autodial.yml")));
    }

    #[test]
    fn test_queue_command() {
        let cli = Cli::try_parse_from([
            "autodial", "queue", "--base", "0917123", "--last4", "9998", "--attempts", "3", "--shuffle",
        ])
        .unwrap();
        match cli.command {
            Commands::Queue { queue } => {
                assert_eq!(queue.base, "0917123");
                assert_eq!(queue.last4, "9998");
                assert_eq!(queue.attempts, 3);
                assert!(queue.shuffle);
            }
            _ => panic!("Expected queue command"),
        }
    }

    #[test]
    fn test_queue_negative_attempts_parse() {
        let cli = Cli::try_parse_from(["autodial", "queue", "-b", "0917123", "-a", "-4"]).unwrap();
        match cli.command {
            Commands::Queue { queue } => assert_eq!(queue.attempts, -4),
            _ => panic!("Expected queue command"),
        }
    }

    #[test]
    fn test_dial_command() {
        let cli = Cli::try_parse_from(["autodial", "dial", "-b", "0917123", "-i", "8", "--simulate"]).unwrap();
        match cli.command {
            Commands::Dial {
                queue,
                interval,
                simulate,
            } => {
                assert_eq!(queue.attempts, 10);
                assert_eq!(queue.last4, "");
                assert_eq!(interval, Some(8));
                assert!(simulate);
            }
            _ => panic!("Expected dial command"),
        }
    }

    #[test]
    fn test_dnc_check() {
        let cli = Cli::try_parse_from(["autodial", "dnc", "check", "09171234567"]).unwrap();
        match cli.command {
            Commands::Dnc {
                command: DncCommands::Check { number },
            } => assert_eq!(number, "09171234567"),
            _ => panic!("Expected dnc check command"),
        }
    }

    #[test]
    fn test_settings_set() {
        let cli = Cli::try_parse_from([
            "autodial",
            "settings",
            "set",
            "--agent",
            "Rhea",
            "--auto-sms-answered",
            "true",
        ])
        .unwrap();
        match cli.command {
            Commands::Settings {
                command: SettingsCommands::Set(update),
            } => {
                assert!(!update.is_empty());
                let mut settings = AgentSettings::default();
                update.apply(&mut settings);
                assert_eq!(settings.agent_name, "Rhea");
                assert!(settings.auto_sms_answered_enabled);
                assert!(settings.auto_sms_enabled);
            }
            _ => panic!("Expected settings set command"),
        }
    }

    #[test]
    fn test_export_output() {
        let cli = Cli::try_parse_from(["autodial", "export", "-o", "out.csv"]).unwrap();
        match cli.command {
            Commands::Export { output } => assert_eq!(output, Some(PathBuf::from("out.csv"))),
            _ => panic!("Expected export command"),
        }
    }

    #[test]
    fn test_range_report() {
        let cli = Cli::try_parse_from([
            "autodial",
            "report",
            "--range",
            "9am - 11am",
            "-n",
            "09171230009",
            "--qualified",
            "--status",
            "not-interested",
        ])
        .unwrap();
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.range, "9am - 11am");
                assert_eq!(args.number, "09171230009");
                let report = args.fields().into_report("S-1");
                assert!(report.qualified);
                assert!(!report.texts_outbound);
                assert_eq!(report.text_inbound, "NO");
                assert_eq!(report.status, ReportStatus::NotInterested);
                assert_eq!(report.series, "S-1");
            }
            _ => panic!("Expected report command"),
        }
    }

    #[test]
    fn test_range_report_requires_number() {
        assert!(Cli::try_parse_from(["autodial", "report", "--range", "9am - 11am"]).is_err());
        assert!(Cli::try_parse_from(["autodial", "report", "-r", "9am - 11am", "-n", "1", "--status", "sold"]).is_err());
    }

    #[test]
    fn test_help_works() {
        // Verify help doesn't panic
        Cli::command().debug_assert();
    }
}
