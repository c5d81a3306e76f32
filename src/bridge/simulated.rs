//! Stand-in host that "places" calls locally.
//!
//! Each number completes after the dial interval with a random status. After
//! a completion the next number waits until the host is told to move on,
//! either by `proceed_to_next_call` or by the sheet update that follows a
//! report.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DialStart, Dialer, HostAdmin, HostEvent, SheetRowUpdate};
use crate::domain::{AgentSettings, CallStatus};
use crate::error::{DialerError, Result};
use crate::sequencer::SequencerInput;

const STATUSES: [CallStatus; 3] = [CallStatus::Answered, CallStatus::Unanswered, CallStatus::Busy];

#[derive(Default)]
struct SimState {
    queue: VecDeque<String>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

pub struct SimulatedDialer {
    events: mpsc::Sender<SequencerInput>,
    state: Mutex<SimState>,
}

impl SimulatedDialer {
    pub fn new(events: mpsc::Sender<SequencerInput>) -> Self {
        Self {
            events,
            state: Mutex::new(SimState::default()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SimState>> {
        self.state.lock().map_err(|e| DialerError::NativeBridge(e.to_string()))
    }

    /// Schedule the next queued number, if any.
    fn dial_next(&self) -> Result<()> {
        let mut state = self.lock()?;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        let Some(number) = state.queue.pop_front() else {
            log::info!("Simulated host: queue finished");
            return Ok(());
        };

        let status = STATUSES[rand::rng().random_range(0..STATUSES.len())];
        let interval = state.interval;
        let events = self.events.clone();
        log::debug!("Simulated host: dialing {} ({:?})", number, interval);

        state.task = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let _ = events.send(HostEvent::call_completed(number, status).into()).await;
        }));
        Ok(())
    }
}

#[async_trait]
impl Dialer for SimulatedDialer {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn start_dial(&self, numbers: &[String], interval_ms: u64) -> Result<DialStart> {
        {
            let mut state = self.lock()?;
            state.queue = numbers.iter().cloned().collect();
            state.interval = Duration::from_millis(interval_ms);
        }
        self.dial_next()?;
        Ok(DialStart::Sequential)
    }

    async fn set_post_call_interval(&self, _interval_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn set_default_sheet_id(&self, _sheet_id: &str) -> Result<()> {
        Ok(())
    }

    async fn proceed_to_next_call(&self) -> Result<()> {
        self.dial_next()
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.queue.clear();
        if let Some(task) = state.task.take() {
            task.abort();
        }
        Ok(())
    }

    async fn update_sheet_row(&self, update: &SheetRowUpdate) -> Result<()> {
        log::debug!("Simulated host: sheet row for {} -> {}", update.number, update.status);
        self.dial_next()
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

    #[tokio::test]
    async fn test_completes_one_call_at_a_time() {
        let (tx, mut rx) = mpsc::channel(8);
        let dialer = SimulatedDialer::new(tx);
        let numbers = vec!["111".to_string(), "222".to_string()];

        dialer.start_dial(&numbers, 10).await.unwrap();
        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        match first {
            SequencerInput::Host(HostEvent::CallCompleted { number, status }) => {
                assert_eq!(number, "111");
                assert!(status.parse::<CallStatus>().is_ok());
            }
            other => panic!("unexpected input: {:?}", other),
        }

        // Nothing further until told to proceed
        assert!(tokio::time::timeout(Duration::from_millis(50), rx.recv()).await.is_err());

        dialer.proceed_to_next_call().await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert!(matches!(
            second,
            SequencerInput::Host(HostEvent::CallCompleted { ref number, .. }) if number == "222"
        ));
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_call() {
        let (tx, mut rx) = mpsc::channel(8);
        let dialer = SimulatedDialer::new(tx);

        dialer.start_dial(&["111".to_string()], 30).await.unwrap();
        dialer.stop().await.unwrap();

        assert!(tokio::time::timeout(Duration::from_millis(100), rx.recv()).await.is_err());

        // A cleared queue has nothing left to dial
        dialer.proceed_to_next_call().await.unwrap();
        assert!(tokio::time::timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }
}
