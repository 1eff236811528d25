//! WebSocket client for the Kraken v2 API
//!
//! One instance owns one socket (public or authenticated). Outgoing frames go
//! through a writer task; a reader task routes channel data to the sender
//! registered for it and hands request acknowledgements back to the caller
//! waiting on that `req_id`.

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, instrument, trace, warn};

use super::messages::*;
use crate::common::channels::EventSender;
use crate::common::errors::{Result, TraderError};
use crate::common::types::{BalanceSnapshot, BalanceUpdate, ConnectionStatus, MarketEvent, TickerUpdate};

type WsRead = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Route key for the balances channel
pub const BALANCES_ROUTE: &str = "balances";

/// Route key for one symbol on the ticker channel
pub fn ticker_route(symbol: &str) -> String {
    format!("ticker:{}", symbol)
}

/// A decoded incoming frame
#[derive(Debug)]
pub enum Incoming {
    /// Acknowledgement of a request
    Response(WsResponse),
    /// Channel data, keyed by route
    Events(Vec<(String, MarketEvent)>),
    Heartbeat,
    /// Exchange system status (`online`, `maintenance`, ...)
    Status(String),
    Unknown(String),
}

/// State shared between the client and its reader task
#[derive(Default)]
struct Shared {
    routes: RwLock<HashMap<String, EventSender>>,
    pending: Mutex<HashMap<u64, oneshot::Sender<WsResponse>>>,
}

impl Shared {
    async fn dispatch(&self, text: &str, stream: &str) {
        match KrakenWebSocketClient::parse_message(text) {
            Ok(Incoming::Response(response)) => {
                let waiter = response
                    .req_id
                    .and_then(|id| self.pending.lock().remove(&id));
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => trace!(stream, method = %response.method, "unsolicited response"),
                }
            }
            Ok(Incoming::Events(events)) => {
                for (route, event) in events {
                    let sender = self.routes.read().get(&route).cloned();
                    match sender {
                        Some(sender) => {
                            if sender.send(event).await.is_err() {
                                debug!(stream, route = %route, "subscriber dropped");
                            }
                        }
                        None => trace!(stream, route = %route, "no subscriber for route"),
                    }
                }
            }
            Ok(Incoming::Heartbeat) => self.broadcast(MarketEvent::Heartbeat).await,
            Ok(Incoming::Status(system)) => info!(stream, system = %system, "exchange status"),
            Ok(Incoming::Unknown(raw)) => self.broadcast(MarketEvent::Raw(raw)).await,
            Err(e) => warn!(stream, error = %e, message = %text, "failed to parse message"),
        }
    }

    /// One sender per distinct channel, so shared channels get one copy
    fn distinct_senders(&self) -> Vec<EventSender> {
        let routes = self.routes.read();
        let mut senders: Vec<EventSender> = Vec::new();
        for sender in routes.values() {
            if !senders.iter().any(|s| s.same_channel(sender)) {
                senders.push(sender.clone());
            }
        }
        senders
    }

    async fn broadcast(&self, event: MarketEvent) {
        for sender in self.distinct_senders() {
            let _ = sender.send(event.clone()).await;
        }
    }
}

struct Connection {
    writer: mpsc::UnboundedSender<Message>,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
    ping_task: JoinHandle<()>,
}

/// WebSocket client for one Kraken v2 endpoint
pub struct KrakenWebSocketClient {
    /// WebSocket URL
    url: String,
    /// Stream name used in logs and status events
    name: &'static str,
    /// Ping interval in seconds
    heartbeat_interval: u64,
    /// How long to wait for a request acknowledgement
    request_timeout: Duration,
    /// Connected state flag
    is_connected: Arc<AtomicBool>,
    next_req_id: AtomicU64,
    shared: Arc<Shared>,
    connection: Mutex<Option<Connection>>,
}

impl KrakenWebSocketClient {
    pub fn new(url: &str, name: &'static str) -> Self {
        Self {
            url: url.to_string(),
            name,
            heartbeat_interval: 10,
            request_timeout: Duration::from_secs(10),
            is_connected: Arc::new(AtomicBool::new(false)),
            next_req_id: AtomicU64::new(1),
            shared: Arc::new(Shared::default()),
            connection: Mutex::new(None),
        }
    }

    /// Set the heartbeat interval
    pub fn with_heartbeat_interval(mut self, seconds: u64) -> Self {
        self.heartbeat_interval = seconds.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    /// Open the socket and start the writer, reader and ping tasks
    #[instrument(skip(self), fields(stream = self.name))]
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        info!("Connecting to Kraken WebSocket: {}", self.url);
        let (ws_stream, _response) = connect_async(&self.url)
            .await
            .map_err(|e| TraderError::WebSocketConnection(e.to_string()))?;
        info!("WebSocket connection established");
        self.is_connected.store(true, Ordering::SeqCst);

        let (mut write, read) = ws_stream.split();
        let (writer, mut outgoing) = mpsc::unbounded_channel::<Message>();

        let name = self.name;
        let writer_task = tokio::spawn(async move {
            while let Some(message) = outgoing.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = write.send(message).await {
                    debug!(stream = name, error = %e, "write failed");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let reader_task = tokio::spawn(Self::read_loop(
            read,
            Arc::clone(&self.shared),
            Arc::clone(&self.is_connected),
            name,
        ));

        let ping_writer = writer.clone();
        let heartbeat_interval = self.heartbeat_interval;
        let ping_task = tokio::spawn(async move {
            let ping = WsRequest::<()> {
                method: "ping",
                params: None,
                req_id: None,
            };
            let Ok(ping) = serde_json::to_string(&ping) else {
                return;
            };
            let mut ticker = interval(Duration::from_secs(heartbeat_interval));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if ping_writer.send(Message::Text(ping.clone())).is_err() {
                    break;
                }
            }
        });

        let stale = self.connection.lock().replace(Connection {
            writer,
            writer_task,
            reader_task,
            ping_task,
        });
        // Left over from a socket that dropped on its own
        if let Some(stale) = stale {
            stale.ping_task.abort();
            stale.writer_task.abort();
            stale.reader_task.abort();
        }
        Ok(())
    }

    async fn read_loop(
        mut read: WsRead,
        shared: Arc<Shared>,
        is_connected: Arc<AtomicBool>,
        stream: &'static str,
    ) {
        let status = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => shared.dispatch(&text, stream).await,
                Some(Ok(Message::Close(frame))) => {
                    info!(stream, "WebSocket closed: {:?}", frame);
                    break ConnectionStatus::Disconnected(frame.map(|f| f.reason.to_string()));
                }
                Some(Err(e)) => {
                    warn!(stream, "WebSocket error: {}", e);
                    break ConnectionStatus::Error(e.to_string());
                }
                None => {
                    info!(stream, "WebSocket stream ended");
                    break ConnectionStatus::Disconnected(None);
                }
                Some(Ok(_)) => {}
            }
        };

        is_connected.store(false, Ordering::SeqCst);
        // Dropping the waiters fails every in-flight request
        shared.pending.lock().clear();
        shared
            .broadcast(MarketEvent::ConnectionStatus {
                stream: stream.to_string(),
                status,
            })
            .await;
    }

    fn send_text(&self, text: String) -> Result<()> {
        let connection = self.connection.lock();
        let connection = connection.as_ref().ok_or_else(|| {
            TraderError::WebSocketConnection(format!("{} socket is not connected", self.name))
        })?;
        connection
            .writer
            .send(Message::Text(text))
            .map_err(|e| TraderError::ChannelSend(e.to_string()))
    }

    /// Send a request and wait for its acknowledgement
    ///
    /// A response with `success: false` becomes [`TraderError::ExchangeApi`].
    pub async fn request<P: Serialize>(
        &self,
        method: &'static str,
        params: Option<P>,
    ) -> Result<WsResponse> {
        let req_id = self.next_req_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::to_string(&WsRequest {
            method,
            params,
            req_id: Some(req_id),
        })?;
        debug!(stream = self.name, method, req_id, "sending request");

        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(req_id, tx);
        if let Err(e) = self.send_text(payload) {
            self.shared.pending.lock().remove(&req_id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(TraderError::WebSocketConnection(format!(
                    "{} socket closed before {} was acknowledged",
                    self.name, method
                )))
            }
            Err(_) => {
                self.shared.pending.lock().remove(&req_id);
                return Err(TraderError::Timeout(format!(
                    "{} request {} on {} socket",
                    method, req_id, self.name
                )));
            }
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(TraderError::ExchangeApi(vec![response
                .error
                .unwrap_or_else(|| format!("{} rejected", method))]))
        }
    }

    /// Register `sender` for `route` and subscribe
    ///
    /// The route is registered first so the initial snapshot is not lost.
    pub async fn subscribe(
        &self,
        route: String,
        params: SubscriptionParams,
        sender: EventSender,
    ) -> Result<()> {
        self.shared.routes.write().insert(route.clone(), sender);
        match self.request("subscribe", Some(params)).await {
            Ok(_) => {
                info!(stream = self.name, route = %route, "subscribed");
                Ok(())
            }
            Err(e) => {
                self.shared.routes.write().remove(&route);
                Err(e)
            }
        }
    }

    /// Stop routing `route` and unsubscribe if the socket is still up
    pub async fn unsubscribe(&self, route: &str, params: SubscriptionParams) -> Result<()> {
        self.shared.routes.write().remove(route);
        if !self.is_connected() {
            return Ok(());
        }
        self.request("unsubscribe", Some(params)).await?;
        debug!(stream = self.name, route, "unsubscribed");
        Ok(())
    }

    /// Close the socket and drop every route
    pub async fn close(&self) {
        let connection = self.connection.lock().take();
        if let Some(connection) = connection {
            connection.ping_task.abort();
            let _ = connection.writer.send(Message::Close(None));
            drop(connection.writer);
            if tokio::time::timeout(Duration::from_secs(2), connection.writer_task)
                .await
                .is_err()
            {
                debug!(stream = self.name, "close frame not flushed in time");
            }
            connection.reader_task.abort();
        }

        self.shared.routes.write().clear();
        self.shared.pending.lock().clear();
        self.is_connected.store(false, Ordering::SeqCst);
        info!(stream = self.name, "WebSocket closed");
    }

    /// Parse an incoming WebSocket message
    pub fn parse_message(text: &str) -> Result<Incoming> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        if value.get("method").is_some() {
            return Ok(Incoming::Response(serde_json::from_value(value)?));
        }

        match value.get("channel").and_then(|v| v.as_str()) {
            Some("heartbeat") => Ok(Incoming::Heartbeat),
            Some("status") => {
                let system = value
                    .pointer("/data/0/system")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                Ok(Incoming::Status(system))
            }
            Some("ticker") => {
                let message: ChannelMessage<TickerData> = serde_json::from_value(value)?;
                Ok(Incoming::Events(
                    message
                        .data
                        .into_iter()
                        .map(|t| (ticker_route(&t.symbol), Self::convert_ticker(t)))
                        .collect(),
                ))
            }
            Some("balances") => {
                let message: ChannelMessage<BalanceData> = serde_json::from_value(value)?;
                Ok(Incoming::Events(vec![(
                    BALANCES_ROUTE.to_string(),
                    Self::convert_balances(message),
                )]))
            }
            _ => Ok(Incoming::Unknown(text.to_string())),
        }
    }

    fn convert_ticker(data: TickerData) -> MarketEvent {
        MarketEvent::Ticker(TickerUpdate {
            symbol: data.symbol,
            last: data.last,
            low: data.low,
            high: data.high,
            change: data.change,
            change_pct: data.change_pct,
        })
    }

    fn convert_balances(message: ChannelMessage<BalanceData>) -> MarketEvent {
        if message.is_snapshot() {
            MarketEvent::BalanceSnapshot(
                message
                    .data
                    .into_iter()
                    .map(|b| BalanceSnapshot::new(b.asset, b.balance))
                    .collect(),
            )
        } else {
            MarketEvent::BalanceUpdate(
                message
                    .data
                    .into_iter()
                    .map(|b| BalanceUpdate {
                        asset: b.asset,
                        balance: b.balance,
                        kind: b.kind,
                    })
                    .collect(),
            )
        }
    }
}
