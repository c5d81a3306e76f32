//! Dispatch sequencer.
//!
//! The sequencer owns the dispatch state and drains a single input channel:
//! 1. `Start` filters the queue against the DNC set and hands it to the host
//! 2. Each host completion either starts a DNC skip countdown or records a
//!    call log (with auto-SMS) and waits for the agent's report
//! 3. A filed report is uploaded as CSV and the host is told to move on
//!
//! Every input is handled to completion before the next one is drawn.

mod countdown;
pub mod notice;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;

use crate::bridge::{DialStart, Dialer, HostEvent, SheetRowUpdate};
use crate::dnc::DncSet;
use crate::domain::{AgentSettings, CallLog, CallReport, CallStatus};
use crate::error::{DialerError, Result};
use crate::report::{ReportRow, ReportUploader, build_report_csv, report_filename};
use crate::sms::{SmsSender, decide_auto_sms};
use crate::storage::CallLogStore;

pub use countdown::Countdown;
pub use notice::{ConsoleSink, Notice, NoticeSink};
pub use state::{DispatchState, Phase};

/// Interval used when none is configured
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Shortest gap the host is allowed between dial attempts
pub const MIN_INTERVAL_MS: u64 = 1000;

/// Everything the sequencer reacts to.
#[derive(Debug, Clone)]
pub enum SequencerInput {
    /// Begin dialing the given (unfiltered) queue
    Start(Vec<String>),
    Host(HostEvent),
    /// Report for the call currently awaiting one
    SubmitReport(CallReport),
    /// Report for an earlier call, by log id
    EditReport { call_id: String, report: CallReport },
    CountdownTick { generation: u64 },
    Stop,
    /// Stop and leave the run loop
    Shutdown,
}

impl From<HostEvent> for SequencerInput {
    fn from(event: HostEvent) -> Self {
        SequencerInput::Host(event)
    }
}

/// Timing and defaults for a sequencer.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Seconds between dial attempts
    pub interval_secs: u64,
    /// Seconds the host waits after a call before dialing the next
    pub post_call_interval_secs: u64,
    /// Ticks shown before skipping a DNC number
    pub dnc_countdown_ticks: u32,
    pub countdown_tick: Duration,
    /// Sheet id used when the agent has not set one
    pub default_sheet_id: String,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            post_call_interval_secs: 12,
            dnc_countdown_ticks: 3,
            countdown_tick: Duration::from_secs(1),
            default_sheet_id: String::new(),
        }
    }
}

impl SequencerConfig {
    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    pub fn with_post_call_interval(mut self, secs: u64) -> Self {
        self.post_call_interval_secs = secs;
        self
    }

    pub fn with_countdown(mut self, ticks: u32, every: Duration) -> Self {
        self.dnc_countdown_ticks = ticks;
        self.countdown_tick = every;
        self
    }

    pub fn with_default_sheet_id(mut self, id: impl Into<String>) -> Self {
        self.default_sheet_id = id.into();
        self
    }

    /// Dial interval handed to the host, never below one second.
    pub fn interval_ms(&self) -> u64 {
        let secs = if self.interval_secs == 0 {
            DEFAULT_INTERVAL_SECS
        } else {
            self.interval_secs
        };
        secs.saturating_mul(1000).max(MIN_INTERVAL_MS)
    }

    pub fn post_call_interval_ms(&self) -> u64 {
        self.post_call_interval_secs.saturating_mul(1000)
    }
}

pub struct Sequencer {
    config: SequencerConfig,
    state: DispatchState,
    dnc: DncSet,
    settings: AgentSettings,
    dialer: Box<dyn Dialer>,
    sms: SmsSender,
    uploader: Arc<dyn ReportUploader>,
    logs: Arc<CallLogStore>,
    sink: Arc<dyn NoticeSink>,
    countdown: Countdown,
    input_tx: mpsc::Sender<SequencerInput>,
}

impl Sequencer {
    /// `input_tx` must feed the receiver later passed to [`Sequencer::run`];
    /// countdown ticks are sent through it.
    pub fn new(
        dialer: Box<dyn Dialer>,
        logs: Arc<CallLogStore>,
        uploader: Arc<dyn ReportUploader>,
        sink: Arc<dyn NoticeSink>,
        input_tx: mpsc::Sender<SequencerInput>,
    ) -> Self {
        Self {
            config: SequencerConfig::default(),
            state: DispatchState::new(),
            dnc: DncSet::new(),
            settings: AgentSettings::default(),
            dialer,
            sms: SmsSender::log_only(),
            uploader,
            logs,
            sink,
            countdown: Countdown::new(),
            input_tx,
        }
    }

    pub fn with_config(mut self, config: SequencerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_dnc(mut self, dnc: DncSet) -> Self {
        self.dnc = dnc;
        self
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_sms(mut self, sms: SmsSender) -> Self {
        self.sms = sms;
        self
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.state.phase
    }

    /// Drain inputs until `Shutdown` or the channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<SequencerInput>) {
        while let Some(input) = rx.recv().await {
            let shutdown = matches!(input, SequencerInput::Shutdown);
            if let Err(e) = self.handle(input).await {
                self.report_error(&e);
            }
            if shutdown {
                break;
            }
        }
        log::debug!("Sequencer loop exited");
    }

    /// Handle one input.
    pub async fn handle(&mut self, input: SequencerInput) -> Result<()> {
        match input {
            SequencerInput::Start(queue) => self.start(queue).await,
            SequencerInput::Host(event) => self.on_host_event(event).await,
            SequencerInput::SubmitReport(report) => self.submit_report(report).await.map(|_| ()),
            SequencerInput::EditReport { call_id, report } => self.file_report(&call_id, &report).await.map(|_| ()),
            SequencerInput::CountdownTick { generation } => self.on_countdown_tick(generation).await,
            SequencerInput::Stop | SequencerInput::Shutdown => self.stop().await,
        }
    }

    /// Surface an error the way its kind calls for.
    pub fn report_error(&self, err: &DialerError) {
        if err.is_silent() {
            log::debug!("Dropped: {}", err);
        } else if err.is_blocking() {
            log::error!("{}", err);
            self.sink.notify(Notice::Error(err.to_string()));
        } else {
            log::warn!("{}", err);
            self.sink.notify(Notice::Toast(err.to_string()));
        }
    }

    async fn start(&mut self, queue: Vec<String>) -> Result<()> {
        if !self.state.is_idle() || self.state.is_call_active {
            return Err(DialerError::InvalidState(format!(
                "dialing already in progress ({})",
                self.state.phase.name()
            )));
        }

        let (kept, skipped) = self.dnc.filter_queue(&queue);
        if kept.is_empty() {
            return Err(DialerError::EmptyQueue { skipped });
        }
        log::info!(
            "Starting dispatch: {} numbers, {} skipped by DNC, via {} dialer",
            kept.len(),
            skipped,
            self.dialer.name()
        );

        self.state.is_call_active = true;
        let started = match self.dialer.start_dial(&kept, self.config.interval_ms()).await {
            Ok(started) => started,
            Err(e) => {
                self.state.is_call_active = false;
                return Err(match e {
                    DialerError::NativeBridge(_) => e,
                    other => DialerError::NativeBridge(format!("Failed to start dialing: {}", other)),
                });
            }
        };

        self.sink.notify(Notice::DialStarted {
            count: kept.len(),
            skipped,
        });

        if started == DialStart::SingleDirectCall {
            self.state.is_call_active = false;
            self.sink.notify(Notice::Info(format!("Opened dialer for {}", kept[0])));
            return Ok(());
        }

        self.state.begin(kept, skipped);

        if let Err(e) = self.dialer.set_post_call_interval(self.config.post_call_interval_ms()).await {
            log::warn!("Failed to set post-call interval: {}", e);
        }
        let sheet_id = self.settings.sheet_id_or(&self.config.default_sheet_id).to_string();
        if let Err(e) = self.dialer.set_default_sheet_id(&sheet_id).await {
            log::warn!("Failed to set default sheet id: {}", e);
        }
        Ok(())
    }

    async fn on_host_event(&mut self, event: HostEvent) -> Result<()> {
        match event {
            HostEvent::CallCompleted { number, status } => {
                let status = status.parse::<CallStatus>().inspect_err(|e| {
                    log::warn!("Ignoring completion for {}: {}", number, e);
                })?;
                self.on_call_completed(number, status).await
            }
            HostEvent::Countdown { seconds } => {
                self.sink.notify(Notice::HostCountdown { seconds });
                Ok(())
            }
            HostEvent::UploadStart => {
                self.sink.notify(Notice::Info("Uploading Record...".to_string()));
                Ok(())
            }
            HostEvent::UploadDone { ok: true, .. } => {
                self.sink
                    .notify(Notice::Info("Record uploaded. Preparing next call...".to_string()));
                Ok(())
            }
            HostEvent::UploadDone { ok: false, message } => {
                let message = message.filter(|m| !m.is_empty()).unwrap_or_else(|| "Upload failed".to_string());
                self.sink.notify(Notice::Error(message));
                Ok(())
            }
            HostEvent::Error { message } => {
                let message = if message.is_empty() { "Unknown error".to_string() } else { message };
                self.sink.notify(Notice::Error(message));
                Ok(())
            }
            HostEvent::Info { message } => {
                let message = if message.is_empty() { "Success".to_string() } else { message };
                self.sink.notify(Notice::Info(message));
                Ok(())
            }
        }
    }

    async fn on_call_completed(&mut self, number: String, status: CallStatus) -> Result<()> {
        if self.state.is_idle() {
            return Err(DialerError::StaleEvent(format!("completion for {} while idle", number)));
        }
        log::info!("Call completed: {} {}", number, status);

        // A new completion supersedes whatever the previous one started
        self.countdown.cancel();
        if let Phase::AwaitingReport { call_id } = &self.state.phase {
            log::info!("Report for {} not filed before next completion", call_id);
        }

        self.state.complete(&number, status);

        if self.dnc.contains_number(&number) {
            log::info!("{} is in DNC; skipping without a log", number);
            let ticks = self.config.dnc_countdown_ticks;
            if ticks == 0 {
                return self.finish_dnc_skip().await;
            }
            self.state.phase = Phase::DncSkipCountdown {
                number: number.clone(),
                remaining: ticks,
            };
            self.countdown
                .start(ticks, self.config.countdown_tick, self.input_tx.clone());
            self.sink.notify(Notice::DncSkip { number, remaining: ticks });
            return Ok(());
        }

        if let Some(message) = decide_auto_sms(&number, status, &self.settings) {
            if self.sms.send(&message).await {
                self.sink.notify(Notice::Toast(format!("Auto-SMS sent to {}", number)));
            }
        }

        let log = CallLog::completed(&number, status);
        self.logs.create(&log)?;
        self.state.phase = Phase::AwaitingReport {
            call_id: log.id.clone(),
        };
        self.sink.notify(Notice::ReportRequested { log });
        Ok(())
    }

    async fn on_countdown_tick(&mut self, generation: u64) -> Result<()> {
        if !self.countdown.is_current(generation) {
            return Err(DialerError::StaleEvent(format!("countdown tick {}", generation)));
        }
        let Phase::DncSkipCountdown { number, remaining } = &mut self.state.phase else {
            return Err(DialerError::StaleEvent(format!("countdown tick {} outside countdown", generation)));
        };

        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            let notice = Notice::DncSkip {
                number: number.clone(),
                remaining: *remaining,
            };
            self.sink.notify(notice);
            return Ok(());
        }

        self.countdown.cancel();
        self.finish_dnc_skip().await
    }

    /// Tell the host to move past a DNC number, exactly once.
    async fn finish_dnc_skip(&mut self) -> Result<()> {
        if self.state.advance() {
            self.sink.notify(Notice::QueueFinished);
        }
        self.dialer.proceed_to_next_call().await
    }

    async fn submit_report(&mut self, report: CallReport) -> Result<CallLog> {
        let Phase::AwaitingReport { call_id } = &self.state.phase else {
            return Err(DialerError::InvalidState(format!(
                "no call awaiting a report ({})",
                self.state.phase.name()
            )));
        };
        let call_id = call_id.clone();

        let log = self.file_report(&call_id, &report).await?;
        if self.state.advance() {
            self.sink.notify(Notice::QueueFinished);
        }
        Ok(log)
    }

    /// Merge a report into a stored log, upload it and update the host sheet.
    ///
    /// Upload and sheet failures are reported but do not fail the call.
    pub async fn file_report(&mut self, call_id: &str, report: &CallReport) -> Result<CallLog> {
        let mut log = self
            .logs
            .get(call_id)?
            .ok_or_else(|| DialerError::CallLogNotFound(call_id.to_string()))?;
        log.apply_report(report);
        self.logs.update(&log)?;

        let now = Local::now();
        let row = ReportRow::from_report(&log.number, &self.settings.agent_name, report, now);
        let csv = build_report_csv(&[row])?;
        let filename = report_filename(&self.settings.agent_name, now);
        match self.uploader.upload(&filename, &csv).await {
            Ok(()) => self.sink.notify(Notice::Toast("Uploaded report".to_string())),
            Err(e) => {
                log::warn!("Report upload failed for {}: {}", log.number, e);
                self.sink.notify(Notice::Toast(format!("Upload failed: {}", e)));
            }
        }

        let sheet_id = self.settings.sheet_id_or(&self.config.default_sheet_id).to_string();
        if let Err(e) = self.dialer.update_sheet_row(&SheetRowUpdate::for_log(&sheet_id, &log)).await {
            log::warn!("Sheet update failed for {}: {}", log.number, e);
        }

        self.sink.notify(Notice::ReportFiled { log: log.clone() });
        Ok(log)
    }

    async fn stop(&mut self) -> Result<()> {
        self.countdown.cancel();
        let was_idle = self.state.is_idle() && !self.state.is_call_active;
        self.state.reset();

        if let Err(e) = self.dialer.stop().await {
            log::warn!("Dialer stop failed: {}", e);
        }
        if !was_idle {
            log::info!("Dispatch stopped");
            self.sink.notify(Notice::Stopped);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReportStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Calls {
        started: Vec<(Vec<String>, u64)>,
        post_call_ms: Vec<u64>,
        sheet_ids: Vec<String>,
        proceeds: usize,
        stops: usize,
        sheet_rows: Vec<SheetRowUpdate>,
    }

    struct FakeDialer {
        calls: Arc<Mutex<Calls>>,
        start: DialStart,
        fail_start: bool,
    }

    #[async_trait]
    impl Dialer for FakeDialer {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn start_dial(&self, numbers: &[String], interval_ms: u64) -> Result<DialStart> {
            if self.fail_start {
                return Err(DialerError::NativeBridge("startDial threw".to_string()));
            }
            self.calls.lock().unwrap().started.push((numbers.to_vec(), interval_ms));
            Ok(self.start)
        }

        async fn set_post_call_interval(&self, interval_ms: u64) -> Result<()> {
            self.calls.lock().unwrap().post_call_ms.push(interval_ms);
            Ok(())
        }

        async fn set_default_sheet_id(&self, sheet_id: &str) -> Result<()> {
            self.calls.lock().unwrap().sheet_ids.push(sheet_id.to_string());
            Ok(())
        }

        async fn proceed_to_next_call(&self) -> Result<()> {
            self.calls.lock().unwrap().proceeds += 1;
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.calls.lock().unwrap().stops += 1;
            Ok(())
        }

        async fn update_sheet_row(&self, update: &SheetRowUpdate) -> Result<()> {
            self.calls.lock().unwrap().sheet_rows.push(update.clone());
            Ok(())
        }

        async fn save_admin(&self, _settings: &AgentSettings, _sheet_id: &str) -> Result<()> {
            Ok(())
        }

        async fn load_admin(&self) -> Result<Option<crate::bridge::HostAdmin>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<Notice>>);

    impl NoticeSink for RecordingSink {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    #[derive(Default)]
    struct RecordingUploader(Mutex<Vec<(String, String)>>);

    #[async_trait]
    impl ReportUploader for RecordingUploader {
        async fn upload(&self, filename: &str, csv: &str) -> Result<()> {
            self.0.lock().unwrap().push((filename.to_string(), csv.to_string()));
            Ok(())
        }
    }

    struct Harness {
        seq: Sequencer,
        calls: Arc<Mutex<Calls>>,
        sink: Arc<RecordingSink>,
        uploader: Arc<RecordingUploader>,
        logs: Arc<CallLogStore>,
        rx: mpsc::Receiver<SequencerInput>,
        _temp: TempDir,
    }

    fn harness_with(start: DialStart, fail_start: bool, dnc: &[&str]) -> Harness {
        let temp = TempDir::new().unwrap();
        let logs = Arc::new(CallLogStore::open(temp.path()).unwrap());
        let calls = Arc::new(Mutex::new(Calls::default()));
        let sink = Arc::new(RecordingSink::default());
        let uploader = Arc::new(RecordingUploader::default());
        let (tx, rx) = mpsc::channel(16);

        let dialer = FakeDialer {
            calls: Arc::clone(&calls),
            start,
            fail_start,
        };
        let seq = Sequencer::new(
            Box::new(dialer),
            Arc::clone(&logs),
            uploader.clone(),
            sink.clone(),
            tx,
        )
        .with_config(
            SequencerConfig::default()
                .with_countdown(3, Duration::from_millis(5))
                .with_default_sheet_id("default-sheet"),
        )
        .with_dnc(dnc.iter().map(|s| s.to_string()).collect());

        Harness {
            seq,
            calls,
            sink,
            uploader,
            logs,
            rx,
            _temp: temp,
        }
    }

    fn harness(dnc: &[&str]) -> Harness {
        harness_with(DialStart::Sequential, false, dnc)
    }

    fn numbers(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    fn completed(number: &str, status: &str) -> SequencerInput {
        HostEvent::call_completed(number, status).into()
    }

    #[tokio::test]
    async fn test_start_filters_and_hands_off() {
        let mut h = harness(&["5550002"]);
        h.seq
            .handle(SequencerInput::Start(numbers(&["5550001", "5550002", "5550003"])))
            .await
            .unwrap();

        let calls = h.calls.lock().unwrap();
        assert_eq!(calls.started, vec![(numbers(&["5550001", "5550003"]), 5000)]);
        assert_eq!(calls.post_call_ms, vec![12000]);
        assert_eq!(calls.sheet_ids, vec!["default-sheet".to_string()]);
        assert_eq!(*h.seq.phase(), Phase::Dispatching);
        assert!(h.seq.state().is_call_active);
        assert_eq!(h.seq.state().skipped_dnc, 1);
    }

    #[tokio::test]
    async fn test_all_dnc_queue_places_no_call() {
        let mut h = harness(&["5550001", "5550002"]);
        let err = h
            .seq
            .handle(SequencerInput::Start(numbers(&["5550001", "5550002"])))
            .await
            .unwrap_err();

        assert!(matches!(err, DialerError::EmptyQueue { skipped: 2 }));
        assert!(h.calls.lock().unwrap().started.is_empty());
        assert!(h.seq.state().is_idle());
        assert!(!h.seq.state().is_call_active);
    }

    #[tokio::test]
    async fn test_start_while_dispatching_is_rejected() {
        let mut h = harness(&[]);
        h.seq.handle(SequencerInput::Start(numbers(&["1"]))).await.unwrap();
        let err = h.seq.handle(SequencerInput::Start(numbers(&["2"]))).await.unwrap_err();
        assert!(matches!(err, DialerError::InvalidState(_)));
        assert_eq!(h.calls.lock().unwrap().started.len(), 1);
    }

    #[tokio::test]
    async fn test_bridge_start_failure_stays_idle() {
        let mut h = harness_with(DialStart::Sequential, true, &[]);
        let err = h.seq.handle(SequencerInput::Start(numbers(&["1"]))).await.unwrap_err();
        assert!(err.is_blocking());
        assert!(err.to_string().contains("startDial threw"));
        assert!(h.seq.state().is_idle());
        assert!(!h.seq.state().is_call_active);
    }

    #[tokio::test]
    async fn test_single_direct_call_returns_to_idle() {
        let mut h = harness_with(DialStart::SingleDirectCall, false, &[]);
        h.seq.handle(SequencerInput::Start(numbers(&["1", "2"]))).await.unwrap();
        assert!(h.seq.state().is_idle());
        assert!(!h.seq.state().is_call_active);
        assert!(h.calls.lock().unwrap().post_call_ms.is_empty());
    }

    #[tokio::test]
    async fn test_normal_completion_creates_log_and_awaits_report() {
        let mut h = harness(&[]);
        h.seq.handle(SequencerInput::Start(numbers(&["1", "2"]))).await.unwrap();
        h.seq.handle(completed("1", "ANSWERED")).await.unwrap();

        let logs = h.logs.list().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].number, "1");
        assert_eq!(logs[0].duration, "00:00");
        assert_eq!(logs[0].status, CallStatus::Answered);
        assert_eq!(
            *h.seq.phase(),
            Phase::AwaitingReport {
                call_id: logs[0].id.clone()
            }
        );
        assert!(!h.seq.state().is_call_active);
        assert_eq!(h.seq.state().remaining_queue, numbers(&["2"]));
    }

    #[tokio::test]
    async fn test_submit_report_uploads_and_advances() {
        let mut h = harness(&[]);
        h.seq.handle(SequencerInput::Start(numbers(&["1", "2"]))).await.unwrap();
        h.seq.handle(completed("1", "UNANSWERED")).await.unwrap();

        let mut report = CallReport::new("S-1");
        report.qualified = true;
        report.status = ReportStatus::Callback;
        h.seq.handle(SequencerInput::SubmitReport(report)).await.unwrap();

        assert_eq!(*h.seq.phase(), Phase::Dispatching);
        let log = &h.logs.list().unwrap()[0];
        assert_eq!(log.report_status, Some(ReportStatus::Callback));
        assert_eq!(log.qualified, Some(true));

        let uploads = h.uploader.0.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].0.starts_with("Agent - "));
        assert!(uploads[0].1.starts_with("\"Date\",\"Time Log\""));
        assert!(uploads[0].1.contains("\"CALLBACK\",\"S-1\""));

        let calls = h.calls.lock().unwrap();
        assert_eq!(calls.sheet_rows.len(), 1);
        assert_eq!(calls.sheet_rows[0].qualified, "true");
        assert_eq!(calls.sheet_rows[0].sheet_id, "default-sheet");
    }

    #[tokio::test]
    async fn test_report_on_last_number_goes_idle() {
        let mut h = harness(&[]);
        h.seq.handle(SequencerInput::Start(numbers(&["1"]))).await.unwrap();
        h.seq.handle(completed("1", "BUSY")).await.unwrap();
        h.seq
            .handle(SequencerInput::SubmitReport(CallReport::new("S")))
            .await
            .unwrap();

        assert!(h.seq.state().is_idle());
        assert!(h.sink.0.lock().unwrap().contains(&Notice::QueueFinished));
    }

    #[tokio::test]
    async fn test_submit_without_pending_call() {
        let mut h = harness(&[]);
        let err = h
            .seq
            .handle(SequencerInput::SubmitReport(CallReport::new("S")))
            .await
            .unwrap_err();
        assert!(matches!(err, DialerError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_dnc_completion_counts_down_then_proceeds_once() {
        let mut h = harness(&["639171112222"]);
        // The host can report a number that was never queued
        h.seq
            .handle(SequencerInput::Start(numbers(&["09170000001", "09170000002"])))
            .await
            .unwrap();
        h.seq.handle(completed("639171112222", "ANSWERED")).await.unwrap();

        assert!(matches!(h.seq.phase(), Phase::DncSkipCountdown { remaining: 3, .. }));
        assert!(h.logs.is_empty().unwrap());

        for expected_remaining in [2, 1] {
            let tick = h.rx.recv().await.unwrap();
            h.seq.handle(tick).await.unwrap();
            assert!(matches!(
                h.seq.phase(),
                Phase::DncSkipCountdown { remaining, .. } if *remaining == expected_remaining
            ));
            assert_eq!(h.calls.lock().unwrap().proceeds, 0);
        }

        let tick = h.rx.recv().await.unwrap();
        h.seq.handle(tick).await.unwrap();
        assert_eq!(h.calls.lock().unwrap().proceeds, 1);
        assert_eq!(*h.seq.phase(), Phase::Dispatching);
        assert!(h.logs.is_empty().unwrap());
        assert!(h.uploader.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dnc_completion_sends_no_sms() {
        let sent = Arc::new(Mutex::new(0usize));

        struct CountingSms(Arc<Mutex<usize>>);

        #[async_trait]
        impl crate::sms::SmsTransport for CountingSms {
            fn name(&self) -> &'static str {
                "counting"
            }

            async fn send(&self, _message: &crate::sms::SmsMessage) -> Result<()> {
                *self.0.lock().unwrap() += 1;
                Ok(())
            }
        }

        let h = harness(&["5550009"]);
        let mut seq = h.seq.with_sms(SmsSender::new(vec![Box::new(CountingSms(Arc::clone(&sent)))]));
        seq.handle(SequencerInput::Start(numbers(&["1", "2"]))).await.unwrap();

        seq.handle(completed("5550009", "UNANSWERED")).await.unwrap();
        assert_eq!(*sent.lock().unwrap(), 0);

        seq.handle(completed("1", "UNANSWERED")).await.unwrap();
        assert_eq!(*sent.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_completion_while_idle() {
        let mut h = harness(&[]);
        let err = h.seq.handle(completed("1", "ANSWERED")).await.unwrap_err();
        assert!(err.is_silent());
        assert!(h.seq.state().is_idle());
        assert!(h.logs.is_empty().unwrap());
        assert!(h.sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_is_ignored() {
        let mut h = harness(&[]);
        h.seq.handle(SequencerInput::Start(numbers(&["1"]))).await.unwrap();
        let err = h.seq.handle(completed("1", "RINGING")).await.unwrap_err();
        assert!(err.is_silent());
        assert_eq!(*h.seq.phase(), Phase::Dispatching);
        assert!(h.logs.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_stop_cancels_countdown() {
        let mut h = harness(&["5550009"]);
        h.seq.handle(SequencerInput::Start(numbers(&["1"]))).await.unwrap();
        h.seq.handle(completed("5550009", "BUSY")).await.unwrap();
        h.seq.handle(SequencerInput::Stop).await.unwrap();

        assert!(h.seq.state().is_idle());
        assert_eq!(h.calls.lock().unwrap().stops, 1);

        // Any tick that raced the cancel is stale
        while let Ok(Some(tick)) = tokio::time::timeout(Duration::from_millis(50), h.rx.recv()).await {
            assert!(h.seq.handle(tick).await.is_err());
        }
        assert_eq!(h.calls.lock().unwrap().proceeds, 0);
    }

    #[tokio::test]
    async fn test_new_completion_during_countdown_cancels_it() {
        let mut h = harness(&["5550009"]);
        h.seq.handle(SequencerInput::Start(numbers(&["1", "2"]))).await.unwrap();
        h.seq.handle(completed("5550009", "BUSY")).await.unwrap();
        h.seq.handle(completed("1", "ANSWERED")).await.unwrap();

        assert!(matches!(h.seq.phase(), Phase::AwaitingReport { .. }));
        while let Ok(Some(tick)) = tokio::time::timeout(Duration::from_millis(50), h.rx.recv()).await {
            assert!(h.seq.handle(tick).await.is_err());
        }
        assert_eq!(h.calls.lock().unwrap().proceeds, 0);
    }

    #[tokio::test]
    async fn test_edit_earlier_report() {
        let mut h = harness(&[]);
        h.seq.handle(SequencerInput::Start(numbers(&["1", "2"]))).await.unwrap();
        h.seq.handle(completed("1", "ANSWERED")).await.unwrap();
        let first_id = h.logs.list().unwrap()[0].id.clone();
        h.seq.handle(completed("2", "ANSWERED")).await.unwrap();

        let mut report = CallReport::new("S");
        report.status = ReportStatus::DocumentsSent;
        h.seq
            .handle(SequencerInput::EditReport {
                call_id: first_id.clone(),
                report,
            })
            .await
            .unwrap();

        let first = h.logs.get(&first_id).unwrap().unwrap();
        assert_eq!(first.report_status, Some(ReportStatus::DocumentsSent));
        // Still waiting on the second call's report
        assert!(matches!(h.seq.phase(), Phase::AwaitingReport { call_id } if *call_id != first_id));
    }

    #[test]
    fn test_interval_ms_floor() {
        assert_eq!(SequencerConfig::default().interval_ms(), 5000);
        assert_eq!(SequencerConfig::default().with_interval(0).interval_ms(), 5000);
        assert_eq!(SequencerConfig::default().with_interval(1).interval_ms(), 1000);
        assert_eq!(SequencerConfig::default().with_interval(30).interval_ms(), 30000);
    }
}
