//! Live log channel over Socket.IO
//!
//! The server speaks Engine.IO protocol 3 on a WebSocket transport. A
//! session goes:
//!
//! 1. server `0{"sid":..,"pingInterval":..}` (open)
//! 2. server `40` (namespace connect), client subscribes with
//!    `42["job_logging",{"log_id":..,"last_pos":0,"raw_mode":true}]`
//! 3. server `42["job",{..}]` events until the client closes
//!
//! The client pings with `2` every `pingInterval`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use ::http::header::{HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::CasperError;
use crate::http::HttpClient;
use crate::joblog::frame::LogFrame;
use crate::joblog::{FrameSender, LogChannel, LogSession};

/// Polling handshake path, answers 2xx when the channel is served
const PROBE_PATH: &str = "/socket.io/?EIO=3&transport=polling";

const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(25);

/// Frames buffered between the reader task and the streamer
const FRAME_BUFFER: usize = 64;

const PING: &str = "2";
const PONG: &str = "3";

/// Socket.IO log channel of a Cloud Deploy endpoint
pub struct SocketIoChannel {
    http: Arc<HttpClient>,
}

impl SocketIoChannel {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl LogChannel for SocketIoChannel {
    async fn available(&self) -> Result<bool, CasperError> {
        self.http.probe(PROBE_PATH).await
    }

    async fn open(&self, job_id: &str) -> Result<LogSession, CasperError> {
        let url = build_socket_url(self.http.base_url())?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| CasperError::Stream(format!("invalid log channel URL {}: {}", url, e)))?;
        let auth = HeaderValue::from_str(&self.http.basic_auth_header())
            .map_err(|e| CasperError::Config(format!("invalid credentials: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        info!("Connecting to log channel: {}", url);
        let (ws_stream, _) = connect_async(request).await.map_err(|e| {
            CasperError::StreamUnavailable(format!("failed to connect to {}: {}", url, e))
        })?;
        info!("Connected to log channel for job {}", job_id);

        let (frames_tx, frames_rx) = mpsc::channel(FRAME_BUFFER);
        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(relay(ws_stream, job_id.to_string(), frames_tx, close_rx));

        Ok(LogSession::new(frames_rx).with_task(close_tx, task))
    }
}

/// `ws(s)://<endpoint>/socket.io/?EIO=3&transport=websocket`
pub fn build_socket_url(endpoint: &str) -> Result<Url, CasperError> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| CasperError::Config(format!("invalid endpoint {}: {}", endpoint, e)))?;

    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(CasperError::Config(format!(
                "unsupported endpoint scheme: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| CasperError::Config("failed to set log channel scheme".to_string()))?;

    url.set_path(&format!("{}/socket.io/", url.path().trim_end_matches('/')));
    url.set_query(Some("EIO=3&transport=websocket"));
    Ok(url)
}

/// `job_logging` subscription event for a job, from the start of its log
pub(crate) fn subscription(job_id: &str) -> String {
    let event = json!([
        "job_logging",
        { "log_id": job_id, "last_pos": 0, "raw_mode": true }
    ]);
    format!("42{}", event)
}

#[derive(Debug, Deserialize)]
struct Handshake {
    #[serde(rename = "pingInterval", default = "default_ping_millis")]
    ping_interval: u64,
}

fn default_ping_millis() -> u64 {
    DEFAULT_PING_INTERVAL.as_millis() as u64
}

/// Engine.IO packet, with Socket.IO messages unwrapped
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Packet {
    Open { ping_interval: Duration },
    Close,
    Ping,
    Pong,
    Noop,
    Connect,
    Disconnect,
    Event { name: String, payload: Value },
    Error(String),
}

/// Parse one text frame. Unknown or malformed packets give `None`.
pub(crate) fn parse_packet(text: &str) -> Option<Packet> {
    let mut chars = text.chars();
    let kind = chars.next()?;
    let body = chars.as_str();

    match kind {
        '0' => {
            let handshake: Handshake = serde_json::from_str(body).ok()?;
            let ping_interval = match handshake.ping_interval {
                0 => DEFAULT_PING_INTERVAL,
                millis => Duration::from_millis(millis),
            };
            Some(Packet::Open { ping_interval })
        }
        '1' => Some(Packet::Close),
        '2' => Some(Packet::Ping),
        '3' => Some(Packet::Pong),
        '4' => parse_message(body),
        '6' => Some(Packet::Noop),
        _ => None,
    }
}

fn parse_message(text: &str) -> Option<Packet> {
    let mut chars = text.chars();
    let kind = chars.next()?;
    let mut body = chars.as_str();

    // "/namespace," prefix
    if body.starts_with('/') {
        body = body.split_once(',').map(|(_, rest)| rest).unwrap_or("");
    }

    match kind {
        '0' => Some(Packet::Connect),
        '1' => Some(Packet::Disconnect),
        '2' => {
            // optional ack id before the arguments
            let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
            let mut args = serde_json::from_str::<Vec<Value>>(body).ok()?.into_iter();
            let name = args.next()?.as_str()?.to_string();
            let payload = args.next().unwrap_or(Value::Null);
            Some(Packet::Event { name, payload })
        }
        '4' => Some(Packet::Error(body.to_string())),
        _ => None,
    }
}

async fn send_text<S>(ws: &mut WebSocketStream<S>, text: String) -> Result<(), CasperError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    ws.send(Message::Text(text.into()))
        .await
        .map_err(|e| CasperError::Stream(format!("failed to write to log channel: {}", e)))
}

/// Reader task: forwards `job` events until the server closes, the
/// receiver goes away or `close` fires
pub(crate) async fn relay<S>(
    mut ws_stream: WebSocketStream<S>,
    job_id: String,
    frames: FrameSender,
    mut close: oneshot::Receiver<()>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ping_tick = interval_at(Instant::now() + DEFAULT_PING_INTERVAL, DEFAULT_PING_INTERVAL);
    let mut subscribed = false;

    loop {
        tokio::select! {
            _ = &mut close => {
                debug!("Closing log channel for job {}", job_id);
                let _ = ws_stream.close(None).await;
                return;
            }
            _ = ping_tick.tick() => {
                if let Err(e) = send_text(&mut ws_stream, PING.to_string()).await {
                    warn!("Failed to ping log channel: {}", e);
                    let _ = frames.send(Err(e)).await;
                    return;
                }
            }
            msg = ws_stream.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Log channel closed by server");
                        return;
                    }
                    Some(Err(e)) => {
                        error!("Log channel error: {}", e);
                        let _ = frames.send(Err(CasperError::Stream(e.to_string()))).await;
                        return;
                    }
                    Some(Ok(_)) => continue,
                };

                let reply = match parse_packet(&text) {
                    Some(Packet::Open { ping_interval }) => {
                        debug!("Log channel open, ping every {:?}", ping_interval);
                        ping_tick = interval_at(Instant::now() + ping_interval, ping_interval);
                        None
                    }
                    Some(Packet::Connect) if !subscribed => {
                        subscribed = true;
                        debug!("Subscribing to logs of job {}", job_id);
                        Some(subscription(&job_id))
                    }
                    Some(Packet::Ping) => Some(PONG.to_string()),
                    Some(Packet::Event { name, payload }) if name == "job" => {
                        if frames.send(LogFrame::from_payload(&payload)).await.is_err() {
                            return;
                        }
                        None
                    }
                    Some(Packet::Error(reason)) => {
                        let _ = frames
                            .send(Err(CasperError::Stream(format!("log channel refused: {}", reason))))
                            .await;
                        return;
                    }
                    Some(Packet::Close) | Some(Packet::Disconnect) => {
                        debug!("Log channel disconnected by server");
                        return;
                    }
                    other => {
                        debug!("Ignoring log channel packet: {:?}", other);
                        None
                    }
                };

                if let Some(reply) = reply {
                    if let Err(e) = send_text(&mut ws_stream, reply).await {
                        let _ = frames.send(Err(e)).await;
                        return;
                    }
                }
            }
        }
    }
}
