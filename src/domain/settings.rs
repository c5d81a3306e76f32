//! Persisted agent settings blob

use serde::{Deserialize, Serialize};

pub const DEFAULT_ANSWERED_TEMPLATE: &str = "Thank you for answering! We appreciate your time.";
pub const DEFAULT_UNANSWERED_TEMPLATE: &str = "Thank you! We tried reaching you. Please call us back.";

/// Agent and SMS settings stored under a single key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentSettings {
    pub agent_name: String,
    pub branch_name: String,
    pub series: Option<String>,
    pub google_sheet_id: Option<String>,
    pub sms_template_answered: String,
    pub sms_template_unanswered: String,
    /// Auto-SMS after UNANSWERED calls
    pub auto_sms_enabled: bool,
    /// Auto-SMS after ANSWERED calls
    pub auto_sms_answered_enabled: bool,
    pub admin_phone: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            agent_name: String::new(),
            branch_name: String::new(),
            series: None,
            google_sheet_id: None,
            sms_template_answered: DEFAULT_ANSWERED_TEMPLATE.to_string(),
            sms_template_unanswered: DEFAULT_UNANSWERED_TEMPLATE.to_string(),
            auto_sms_enabled: true,
            auto_sms_answered_enabled: false,
            admin_phone: String::new(),
        }
    }
}

impl AgentSettings {
    /// Name used in report rows and filenames
    pub fn display_agent(&self) -> &str {
        if self.agent_name.trim().is_empty() {
            "Agent"
        } else {
            &self.agent_name
        }
    }

    /// Series for new reports, falling back to the base prefix being dialed
    pub fn series_or<'a>(&'a self, base_prefix: &'a str) -> &'a str {
        self.series.as_deref().filter(|s| !s.is_empty()).unwrap_or(base_prefix)
    }

    /// Sheet id pushed to the host, falling back to the configured default
    pub fn sheet_id_or<'a>(&'a self, default_sheet: &'a str) -> &'a str {
        self.google_sheet_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(default_sheet)
    }

    pub fn answered_template(&self) -> &str {
        non_empty_or(&self.sms_template_answered, DEFAULT_ANSWERED_TEMPLATE)
    }

    pub fn unanswered_template(&self) -> &str {
        non_empty_or(&self.sms_template_unanswered, DEFAULT_UNANSWERED_TEMPLATE)
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}
