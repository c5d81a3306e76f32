//! Cancellable countdown that feeds ticks into the sequencer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::SequencerInput;

/// Single-shot tick source.
///
/// Every start or cancel bumps the generation, so a tick already queued
/// from an earlier countdown can be told apart and dropped.
#[derive(Debug, Default)]
pub struct Countdown {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start sending `ticks` ticks, one every `every`. Cancels any running
    /// countdown and returns the new generation.
    pub fn start(&mut self, ticks: u32, every: Duration, tx: mpsc::Sender<SequencerInput>) -> u64 {
        self.cancel();
        let generation = self.generation;

        self.handle = Some(tokio::spawn(async move {
            for _ in 0..ticks {
                tokio::time::sleep(every).await;
                if tx.send(SequencerInput::CountdownTick { generation }).await.is_err() {
                    break;
                }
            }
        }));
        generation
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
