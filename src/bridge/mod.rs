//! Host-platform dialer capability.
//!
//! The host places calls and sends texts; this crate only tells it what to
//! dial and reacts to its events. [`detect_dialer`] picks the implementation
//! once at startup.

pub mod fallback;
pub mod messages;
pub mod native;
pub mod simulated;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{AgentSettings, CallLog};
use crate::error::Result;
use crate::sequencer::SequencerInput;

pub use fallback::{FallbackDialer, SystemOpener, UriOpener};
pub use messages::HostEvent;
pub use native::{BridgeConnection, NativeDialer};
pub use simulated::SimulatedDialer;

/// Sheet tab that report updates are written to
pub const SHEET_TAB: &str = "Sheet1";

/// How the dialer took a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialStart {
    /// Host will dial the whole queue and report each completion
    Sequential,
    /// Only the first number was handed off; no completions will follow
    SingleDirectCall,
}

/// Row update sent to the host after a report is filed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRowUpdate {
    pub sheet_id: String,
    pub tab: String,
    pub number: String,
    /// `"true"` or `"false"`
    pub qualified: String,
    pub status: String,
}

impl SheetRowUpdate {
    pub fn for_log(sheet_id: &str, log: &CallLog) -> Self {
        Self {
            sheet_id: sheet_id.to_string(),
            tab: SHEET_TAB.to_string(),
            number: log.number.clone(),
            qualified: log.qualified.unwrap_or(false).to_string(),
            status: log
                .report_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| log.status.to_string()),
        }
    }
}

/// Agent profile as stored by the host app
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostAdmin {
    pub agent_name: Option<String>,
    pub branch_name: Option<String>,
    pub series: Option<String>,
    pub google_sheet_id: Option<String>,
}

impl HostAdmin {
    /// Overwrite settings with every non-empty host value. Returns whether
    /// anything changed.
    pub fn merge_into(&self, settings: &mut AgentSettings) -> bool {
        let before = settings.clone();
        if let Some(v) = non_empty(&self.agent_name) {
            settings.agent_name = v.to_string();
        }
        if let Some(v) = non_empty(&self.branch_name) {
            settings.branch_name = v.to_string();
        }
        if let Some(v) = non_empty(&self.series) {
            settings.series = Some(v.to_string());
        }
        if let Some(v) = non_empty(&self.google_sheet_id) {
            settings.google_sheet_id = Some(v.to_string());
        }
        *settings != before
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Commands the sequencer can issue to the host.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn start_dial(&self, numbers: &[String], interval_ms: u64) -> Result<DialStart>;

    async fn set_post_call_interval(&self, interval_ms: u64) -> Result<()>;

    async fn set_default_sheet_id(&self, sheet_id: &str) -> Result<()>;

    async fn proceed_to_next_call(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn update_sheet_row(&self, update: &SheetRowUpdate) -> Result<()>;

    async fn save_admin(&self, settings: &AgentSettings, sheet_id: &str) -> Result<()>;

    /// Profile saved on the host, if the host keeps one
    async fn load_admin(&self) -> Result<Option<HostAdmin>>;
}

/// Outcome of [`detect_dialer`]
pub struct DetectedDialer {
    pub dialer: Box<dyn Dialer>,
    /// Present when the host bridge is reachable, for SMS over the bridge
    pub connection: Option<Arc<BridgeConnection>>,
}

/// Connect to the host bridge if a socket is configured and reachable,
/// otherwise fall back to a single direct call.
pub async fn detect_dialer(
    socket_path: Option<&Path>,
    request_timeout: Duration,
    events: mpsc::Sender<SequencerInput>,
) -> DetectedDialer {
    if let Some(path) = socket_path {
        match BridgeConnection::connect(path, request_timeout, events).await {
            Ok(conn) => {
                let conn = Arc::new(conn);
                return DetectedDialer {
                    dialer: Box::new(NativeDialer::new(Arc::clone(&conn))),
                    connection: Some(conn),
                };
            }
            Err(e) => log::warn!("Host bridge unavailable at {}: {}", path.display(), e),
        }
    }

    DetectedDialer {
        dialer: Box::new(FallbackDialer::system()),
        connection: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CallReport, CallStatus, ReportStatus};

    #[test]
    fn test_host_admin_fills_non_empty_fields() {
        let admin: HostAdmin =
            serde_json::from_str(r#"{"agentName":"Rhea","branchName":"","googleSheetId":"sheet-7"}"#).unwrap();
        let mut settings = AgentSettings {
            branch_name: "Makati".to_string(),
            series: Some("S-1".to_string()),
            ..Default::default()
        };

        assert!(admin.merge_into(&mut settings));
        assert_eq!(settings.agent_name, "Rhea");
        assert_eq!(settings.branch_name, "Makati");
        assert_eq!(settings.series.as_deref(), Some("S-1"));
        assert_eq!(settings.google_sheet_id.as_deref(), Some("sheet-7"));

        // A second merge has nothing new to apply
        assert!(!admin.merge_into(&mut settings));
    }
    use tempfile::TempDir;

    #[test]
    fn test_sheet_row_update_for_reported_log() {
        let mut log = CallLog::completed("09171230001", CallStatus::Answered);
        let mut report = CallReport::new("S-1");
        report.qualified = true;
        report.status = ReportStatus::Callback;
        log.apply_report(&report);

        let update = SheetRowUpdate::for_log("sheet", &log);
        assert_eq!(update.tab, "Sheet1");
        assert_eq!(update.qualified, "true");
        assert_eq!(update.status, "CALLBACK");

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["sheetId"], "sheet");
    }

    #[tokio::test]
    async fn test_detect_without_socket_falls_back() {
        let (tx, _rx) = mpsc::channel(1);
        let detected = detect_dialer(None, Duration::from_secs(1), tx).await;
        assert_eq!(detected.dialer.name(), "fallback");
        assert!(detected.connection.is_none());
    }

    #[tokio::test]
    async fn test_detect_unreachable_socket_falls_back() {
        let temp = TempDir::new().unwrap();
        let (tx, _rx) = mpsc::channel(1);
        let path = temp.path().join("missing.sock");
        let detected = detect_dialer(Some(&path), Duration::from_secs(1), tx).await;
        assert_eq!(detected.dialer.name(), "fallback");
    }
}
