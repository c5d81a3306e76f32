//! Host bridge reached over a Unix socket.
//!
//! Provides:
//! - Request/response commands correlated by id
//! - Forwarding of host events into the sequencer input channel

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, WriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{Mutex, mpsc, oneshot};

use super::messages::{BridgeRequest, BridgeResponse, HostEvent, HostMessage};
use super::{DialStart, Dialer, HostAdmin, SheetRowUpdate};
use crate::domain::AgentSettings;
use crate::error::{DialerError, Result};
use crate::sequencer::SequencerInput;

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<BridgeResponse>>>>;

/// Live connection to the host bridge, shared by the dialer and SMS transport.
pub struct BridgeConnection {
    socket_path: PathBuf,
    writer: Mutex<Option<WriteHalf<UnixStream>>>,
    pending: Pending,
    next_id: AtomicU64,
    connected: Arc<AtomicBool>,
    request_timeout: Duration,
}

impl BridgeConnection {
    /// Connect and start forwarding host events to `events`.
    pub async fn connect(
        socket_path: impl AsRef<Path>,
        request_timeout: Duration,
        events: mpsc::Sender<SequencerInput>,
    ) -> Result<Self> {
        let socket_path = socket_path.as_ref().to_path_buf();
        let stream = UnixStream::connect(&socket_path)
            .await
            .map_err(|e| DialerError::NativeBridge(format!("Failed to connect: {}", e)))?;

        let (reader, writer) = tokio::io::split(stream);
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let connected = Arc::new(AtomicBool::new(true));

        // The reader never waits on the sequencer, which may itself be
        // waiting on a reply this reader has to deliver
        let (forward_tx, mut forward_rx) = mpsc::unbounded_channel::<HostEvent>();
        tokio::spawn(async move {
            while let Some(event) = forward_rx.recv().await {
                if events.send(event.into()).await.is_err() {
                    break;
                }
            }
        });

        let pending_clone = Arc::clone(&pending);
        let connected_clone = Arc::clone(&connected);
        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match HostMessage::parse(line) {
                            Some(HostMessage::Response(response)) => {
                                if let Some(tx) = pending_clone.lock().await.remove(&response.id) {
                                    let _ = tx.send(response);
                                }
                            }
                            Some(HostMessage::Event(event)) => {
                                log::debug!("Host event: {:?}", event);
                                if forward_tx.send(event).is_err() {
                                    break;
                                }
                            }
                            None => log::warn!("Ignoring unrecognized host line: {}", line),
                        }
                    }
                }
            }

            connected_clone.store(false, Ordering::SeqCst);
            // Fail any callers still waiting on a reply
            pending_clone.lock().await.clear();
            log::info!("Host bridge connection closed");
        });

        log::info!("Connected to host bridge at {}", socket_path.display());
        Ok(Self {
            socket_path,
            writer: Mutex::new(Some(writer)),
            pending,
            next_id: AtomicU64::new(1),
            connected,
            request_timeout,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send a command and wait for the host's reply.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        if !self.is_connected() {
            return Err(DialerError::NativeBridge("Not connected".into()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let mut json = serde_json::to_string(&BridgeRequest::new(id, method, params))?;
        json.push('\n');

        {
            let mut writer = self.writer.lock().await;
            let write_result = match writer.as_mut() {
                Some(w) => match w.write_all(json.as_bytes()).await {
                    Ok(()) => w.flush().await,
                    Err(e) => Err(e),
                },
                None => Err(std::io::Error::new(std::io::ErrorKind::NotConnected, "writer closed")),
            };
            if let Err(e) = write_result {
                self.pending.lock().await.remove(&id);
                return Err(DialerError::NativeBridge(format!("{} failed: {}", method, e)));
            }
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => match response.error {
                Some(message) => Err(DialerError::NativeBridge(format!("{} failed: {}", method, message))),
                None => Ok(response.result.unwrap_or(Value::Null)),
            },
            Ok(Err(_)) => Err(DialerError::NativeBridge(format!("{}: connection closed", method))),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(DialerError::NativeBridge(format!("{}: timed out", method)))
            }
        }
    }

    /// Ask the host to send a text message.
    pub async fn send_sms(&self, number: &str, message: &str) -> Result<()> {
        self.request("sendSms", json!({ "phoneNumber": number, "message": message }))
            .await
            .map(|_| ())
    }

    pub async fn close(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        self.connected.store(false, Ordering::SeqCst);
        log::debug!("Closed host bridge at {}", self.socket_path.display());
    }
}

/// Dialer backed by the host bridge.
pub struct NativeDialer {
    conn: Arc<BridgeConnection>,
}

impl NativeDialer {
    pub fn new(conn: Arc<BridgeConnection>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Dialer for NativeDialer {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn start_dial(&self, numbers: &[String], interval_ms: u64) -> Result<DialStart> {
        self.conn
            .request("startDial", json!({ "numbers": numbers, "intervalMs": interval_ms }))
            .await?;
        Ok(DialStart::Sequential)
    }

    async fn set_post_call_interval(&self, interval_ms: u64) -> Result<()> {
        self.conn
            .request("setPostCallInterval", json!({ "intervalMs": interval_ms }))
            .await
            .map(|_| ())
    }

    async fn set_default_sheet_id(&self, sheet_id: &str) -> Result<()> {
        self.conn
            .request("setDefaultSheetId", json!({ "sheetId": sheet_id }))
            .await
            .map(|_| ())
    }

    async fn proceed_to_next_call(&self) -> Result<()> {
        self.conn.request("proceedToNextCall", Value::Null).await.map(|_| ())
    }

    async fn stop(&self) -> Result<()> {
        self.conn.request("stopDial", Value::Null).await.map(|_| ())
    }

    async fn update_sheet_row(&self, update: &SheetRowUpdate) -> Result<()> {
        self.conn
            .request("updateQualifiedAndStatus", serde_json::to_value(update)?)
            .await
            .map(|_| ())
    }

    async fn save_admin(&self, settings: &AgentSettings, sheet_id: &str) -> Result<()> {
        self.conn
            .request(
                "saveAdminEx",
                json!({
                    "agentName": settings.agent_name,
                    "series": settings.series,
                    "googleSheetId": sheet_id,
                    "branchName": settings.branch_name,
                }),
            )
            .await
            .map(|_| ())
    }

    async fn load_admin(&self) -> Result<Option<HostAdmin>> {
        let value = self.conn.request("loadAdmin", Value::Null).await?;
        parse_host_admin(value)
    }
}

/// The host answers with either a JSON object or the raw JSON text it stored.
fn parse_host_admin(value: Value) -> Result<Option<HostAdmin>> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::String(raw) if raw.trim().is_empty() => return Ok(None),
        Value::String(raw) => serde_json::from_str(&raw),
        other => serde_json::from_value(other),
    };
    parsed
        .map(Some)
        .map_err(|e| DialerError::NativeBridge(format!("Failed to parse native admin data: {}", e)))
}
