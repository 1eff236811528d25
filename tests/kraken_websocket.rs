//! Integration tests for the Kraken WebSocket client
//!
//! A local tungstenite server stands in for `wss://ws.kraken.com/v2`: it
//! acknowledges subscribe/unsubscribe requests and pushes a ticker snapshot
//! after each successful subscribe.

mod common;

use common::ws_messages::TICKER_SNAPSHOT;
use futures_util::{SinkExt, StreamExt};
use kraken_trader::common::channels::create_event_channel;
use kraken_trader::kraken::messages::SubscriptionParams;
use kraken_trader::kraken::websocket::{ticker_route, KrakenWebSocketClient};
use kraken_trader::{MarketEvent, TraderError};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};

/// Symbol the fake server refuses
const UNSUPPORTED: &str = "FOO/BAR";

/// Test timeout for WebSocket operations
const WS_TIMEOUT: Duration = Duration::from_secs(5);

/// Start a one-connection server; the handle yields every request received
async fn spawn_server() -> (String, JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut requests = Vec::new();

        while let Some(Ok(message)) = ws.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let request: Value = serde_json::from_str(&text).unwrap();
            let method = request["method"].as_str().unwrap_or_default().to_string();
            let req_id = request["req_id"].clone();
            let symbol = request["params"]["symbol"][0]
                .as_str()
                .unwrap_or_default()
                .to_string();
            requests.push(request);

            let reply = match method.as_str() {
                "subscribe" if symbol == UNSUPPORTED => json!({
                    "method": "subscribe",
                    "req_id": req_id,
                    "success": false,
                    "error": format!("Currency pair not supported {UNSUPPORTED}"),
                }),
                "subscribe" | "unsubscribe" => json!({
                    "method": method,
                    "req_id": req_id,
                    "success": true,
                    "result": {"channel": "ticker", "symbol": symbol},
                }),
                _ => continue,
            };
            ws.send(Message::Text(reply.to_string())).await.unwrap();

            if method == "subscribe" && symbol != UNSUPPORTED {
                ws.send(Message::Text(TICKER_SNAPSHOT.to_string()))
                    .await
                    .unwrap();
            }
        }

        requests
    });

    (format!("ws://{}", addr), server)
}

#[tokio::test]
async fn test_subscribe_routes_ticker_and_unsubscribe_is_acknowledged() {
    let (url, server) = spawn_server().await;
    let client = KrakenWebSocketClient::new(&url, "public");
    client.connect().await.unwrap();
    assert!(client.is_connected());

    let (tx, mut rx) = create_event_channel();
    client
        .subscribe(
            ticker_route("BTC/USD"),
            SubscriptionParams::ticker("BTC/USD"),
            tx,
        )
        .await
        .unwrap();

    let event = timeout(WS_TIMEOUT, rx.recv())
        .await
        .expect("Timed out waiting for ticker")
        .expect("Channel closed");
    match event {
        MarketEvent::Ticker(ticker) => {
            assert_eq!(ticker.symbol, "BTC/USD");
            assert_eq!(ticker.last, Some(dec!(65000)));
            assert_eq!(ticker.change_pct, Some(dec!(-1.19)));
        }
        other => panic!("Expected Ticker, got {:?}", other),
    }

    client
        .unsubscribe(
            &ticker_route("BTC/USD"),
            SubscriptionParams::ticker("BTC/USD"),
        )
        .await
        .unwrap();
    client.close().await;
    assert!(!client.is_connected());

    let requests = timeout(WS_TIMEOUT, server).await.unwrap().unwrap();
    let methods: Vec<&str> = requests
        .iter()
        .filter_map(|r| r["method"].as_str())
        .collect();
    assert_eq!(methods, vec!["subscribe", "unsubscribe"]);
    assert_eq!(requests[0]["params"]["channel"], "ticker");
}

#[tokio::test]
async fn test_rejected_subscription_is_exchange_error() {
    let (url, _server) = spawn_server().await;
    let client = KrakenWebSocketClient::new(&url, "public");
    client.connect().await.unwrap();

    let (tx, mut rx) = create_event_channel();
    let result = client
        .subscribe(
            ticker_route(UNSUPPORTED),
            SubscriptionParams::ticker(UNSUPPORTED),
            tx,
        )
        .await;

    match result {
        Err(TraderError::ExchangeApi(errors)) => {
            assert_eq!(errors, vec![format!("Currency pair not supported {UNSUPPORTED}")]);
        }
        other => panic!("Expected ExchangeApi error, got {:?}", other),
    }

    // The route was dropped along with its sender
    client.close().await;
    assert!(timeout(WS_TIMEOUT, rx.recv()).await.unwrap().is_none());
}
