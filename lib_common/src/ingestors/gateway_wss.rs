//! # Gateway WSS Source
//!
//! WebSocket client for the chat platform's real-time gateway. It speaks just
//! enough of the protocol to receive new messages:
//!
//! 1. wait for Hello (op 10) and read the heartbeat period from it;
//! 2. send Identify (op 2) with the bot token and intents;
//! 3. while reading, send a heartbeat (op 1, last sequence number) every period
//!    and immediately when the gateway asks for one;
//! 4. hand `MESSAGE_CREATE` dispatches to the caller.
//!
//! Reconnect (op 7) and Invalid Session (op 9) surface as errors so the runner
//! starts a fresh connection.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{IngestError, MessageSource};
use crate::model::InboundMessage;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

/// Guild messages plus message content.
pub const DEFAULT_INTENTS: u64 = 33280;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub token: String,
    pub intents: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
            token: String::new(),
            intents: DEFAULT_INTENTS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

/// A decoded gateway frame.
#[derive(Debug, PartialEq)]
enum Frame {
    Hello { heartbeat: Duration },
    Ready { session_id: Option<String> },
    MessageCreate(Box<InboundMessage>),
    OtherDispatch(String),
    HeartbeatRequest,
    HeartbeatAck,
    Reconnect,
    InvalidSession,
    Unknown(u8),
}

/// Decodes one text frame, returning its sequence number alongside.
fn decode_frame(text: &str) -> Result<(Option<u64>, Frame), IngestError> {
    let payload: GatewayPayload = serde_json::from_str(text)?;

    let frame = match payload.op {
        OP_HELLO => {
            let millis = payload
                .d
                .get("heartbeat_interval")
                .and_then(Value::as_u64)
                .ok_or_else(|| IngestError::Protocol("hello without heartbeat_interval".into()))?;
            Frame::Hello {
                heartbeat: Duration::from_millis(millis),
            }
        }
        OP_DISPATCH => match payload.t.as_deref() {
            Some("READY") => Frame::Ready {
                session_id: payload
                    .d
                    .get("session_id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            Some("MESSAGE_CREATE") => Frame::MessageCreate(Box::new(serde_json::from_value(payload.d)?)),
            other => Frame::OtherDispatch(other.unwrap_or_default().to_string()),
        },
        OP_HEARTBEAT => Frame::HeartbeatRequest,
        OP_HEARTBEAT_ACK => Frame::HeartbeatAck,
        OP_RECONNECT => Frame::Reconnect,
        OP_INVALID_SESSION => Frame::InvalidSession,
        op => Frame::Unknown(op),
    };

    Ok((payload.s, frame))
}

fn heartbeat_payload(last_seq: Option<u64>) -> String {
    json!({ "op": OP_HEARTBEAT, "d": last_seq }).to_string()
}

fn identify_payload(config: &GatewayConfig) -> String {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": config.token,
            "intents": config.intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "lib_common",
                "device": "lib_common"
            }
        }
    })
    .to_string()
}

struct Session {
    stream: WsStream,
    heartbeat: Interval,
}

pub struct GatewaySource {
    config: GatewayConfig,
    session: Option<Session>,
    last_seq: Option<u64>,
    session_id: Option<String>,
}

impl GatewaySource {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            session: None,
            last_seq: None,
            session_id: None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn send_heartbeat(stream: &mut WsStream, last_seq: Option<u64>) -> Result<(), IngestError> {
        stream
            .send(Message::Text(heartbeat_payload(last_seq).into()))
            .await?;
        log::debug!("Gateway heartbeat sent (seq {:?})", last_seq);
        Ok(())
    }
}

#[async_trait]
impl MessageSource for GatewaySource {
    async fn connect(&mut self) -> Result<(), IngestError> {
        self.session = None;
        log::info!("Connecting to gateway: {}", self.config.url);

        let (mut stream, _) = connect_async(self.config.url.as_str())
            .await
            .map_err(|source| IngestError::Connect {
                url: self.config.url.clone(),
                source,
            })?;

        let period = loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    if let (_, Frame::Hello { heartbeat }) = decode_frame(&text)? {
                        break heartbeat;
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Err(IngestError::Closed),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        };

        stream.send(Message::Text(identify_payload(&self.config).into())).await?;
        log::info!("Gateway hello received, heartbeat every {}ms; identify sent", period.as_millis());

        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.session = Some(Session { stream, heartbeat });
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Option<InboundMessage>, IngestError> {
        let Some(session) = self.session.as_mut() else {
            return Err(IngestError::Protocol("not connected".into()));
        };

        loop {
            tokio::select! {
                msg = session.stream.next() => {
                    let text = match msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(frame))) => {
                            log::warn!("Gateway closed the connection: {:?}", frame);
                            self.session = None;
                            return Ok(None);
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            self.session = None;
                            return Err(e.into());
                        }
                        None => {
                            log::warn!("Gateway stream ended.");
                            self.session = None;
                            return Ok(None);
                        }
                    };

                    let (seq, frame) = match decode_frame(&text) {
                        Ok(decoded) => decoded,
                        Err(IngestError::Decode(e)) => {
                            log::warn!("Skipping undecodable gateway frame: {}", e);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    if seq.is_some() {
                        self.last_seq = seq;
                    }

                    match frame {
                        Frame::MessageCreate(message) => return Ok(Some(*message)),
                        Frame::Ready { session_id } => {
                            log::info!("Gateway session ready ({:?})", session_id);
                            self.session_id = session_id;
                        }
                        Frame::HeartbeatRequest => Self::send_heartbeat(&mut session.stream, self.last_seq).await?,
                        Frame::HeartbeatAck => log::trace!("Gateway heartbeat acknowledged"),
                        Frame::Reconnect => {
                            self.session = None;
                            return Err(IngestError::ReconnectRequested);
                        }
                        Frame::InvalidSession => {
                            self.session = None;
                            return Err(IngestError::InvalidSession);
                        }
                        Frame::OtherDispatch(kind) => log::trace!("Ignoring dispatch {}", kind),
                        Frame::Hello { .. } | Frame::Unknown(_) => {}
                    }
                }
                _ = session.heartbeat.tick() => {
                    Self::send_heartbeat(&mut session.stream, self.last_seq).await?;
                }
            }
        }
    }
}
