//! Dialer used when no host bridge is reachable.
//!
//! It can only place a single direct call by handing a `tel:` URI to the
//! system opener. Everything else is a no-op.

use std::process::{Command, Stdio};

use async_trait::async_trait;

use super::{DialStart, Dialer, HostAdmin, SheetRowUpdate};
use crate::domain::AgentSettings;
use crate::error::{DialerError, Result};

/// Opens a URI with the platform's default handler
pub trait UriOpener: Send + Sync {
    fn open(&self, uri: &str) -> Result<()>;
}

/// `xdg-open` on Linux, `open` on macOS
pub struct SystemOpener;

impl UriOpener for SystemOpener {
    fn open(&self, uri: &str) -> Result<()> {
        let program = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
        Command::new(program)
            .arg(uri)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| DialerError::NativeBridge(format!("Failed to run {}: {}", program, e)))
    }
}

pub struct FallbackDialer {
    opener: Box<dyn UriOpener>,
}

impl FallbackDialer {
    pub fn new(opener: Box<dyn UriOpener>) -> Self {
        Self { opener }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemOpener))
    }
}

#[async_trait]
impl Dialer for FallbackDialer {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn start_dial(&self, numbers: &[String], _interval_ms: u64) -> Result<DialStart> {
        let first = numbers
            .first()
            .ok_or_else(|| DialerError::InvalidState("no numbers to dial".to_string()))?;
        let uri = format!("tel:{}", first);
        log::info!("No host bridge; opening {}", uri);
        self.opener.open(&uri)?;
        Ok(DialStart::SingleDirectCall)
    }

    async fn set_post_call_interval(&self, _interval_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn set_default_sheet_id(&self, _sheet_id: &str) -> Result<()> {
        Ok(())
    }

    async fn proceed_to_next_call(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn update_sheet_row(&self, _update: &SheetRowUpdate) -> Result<()> {
        Ok(())
    }

    async fn save_admin(&self, _settings: &AgentSettings, _sheet_id: &str) -> Result<()> {
        Ok(())
    }

    async fn load_admin(&self) -> Result<Option<HostAdmin>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingOpener(Arc<Mutex<Vec<String>>>);

    impl UriOpener for RecordingOpener {
        fn open(&self, uri: &str) -> Result<()> {
            self.0.lock().unwrap().push(uri.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_opens_first_number_only() {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let dialer = FallbackDialer::new(Box::new(RecordingOpener(Arc::clone(&opened))));

        let numbers = vec!["09171230007".to_string(), "09171230008".to_string()];
        let start = dialer.start_dial(&numbers, 5000).await.unwrap();

        assert_eq!(start, DialStart::SingleDirectCall);
        assert_eq!(*opened.lock().unwrap(), vec!["tel:09171230007".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_queue_is_rejected() {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let dialer = FallbackDialer::new(Box::new(RecordingOpener(Arc::clone(&opened))));
        assert!(dialer.start_dial(&[], 5000).await.is_err());
        assert!(opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_has_no_host_profile() {
        let dialer = FallbackDialer::new(Box::new(RecordingOpener(Arc::new(Mutex::new(Vec::new())))));
        assert_eq!(dialer.load_admin().await.unwrap(), None);
    }
}
