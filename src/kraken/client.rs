//! Main Kraken client that combines REST and WebSocket functionality

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument, warn};

use super::messages::{AddOrderParams, AddOrderResult, SubscriptionParams};
use super::rest::KrakenRestClient;
use super::websocket::{ticker_route, KrakenWebSocketClient, BALANCES_ROUTE};
use crate::common::channels::EventSender;
use crate::common::errors::{Result, TraderError};
use crate::common::traits::ExchangeClient;
use crate::common::types::{OrderReceipt, Side, SubscriptionId, SymbolPair};
use crate::config::KrakenConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActiveSubscription {
    Ticker(String),
    Balances,
}

/// Combined Kraken client: public socket for tickers, authenticated socket
/// for balances and orders
///
/// Without API credentials only the public socket is opened; balance
/// subscriptions and orders then fail with an authentication error.
pub struct KrakenClient {
    /// REST API client, used for the socket session token
    rest_client: KrakenRestClient,
    /// Public market data socket
    public_ws: KrakenWebSocketClient,
    /// Authenticated socket, present when credentials are configured
    private_ws: Option<KrakenWebSocketClient>,
    /// Session token for the authenticated socket
    token: RwLock<Option<String>>,
    subscriptions: Mutex<HashMap<SubscriptionId, ActiveSubscription>>,
    next_subscription_id: AtomicU64,
}

impl KrakenClient {
    /// Create a new Kraken client from configuration
    pub fn new(config: KrakenConfig) -> Result<Self> {
        let rest_client = KrakenRestClient::with_timeout(&config.rest_url, config.request_timeout())?;

        let public_ws = KrakenWebSocketClient::new(&config.websocket_url, "public")
            .with_heartbeat_interval(config.heartbeat_interval_seconds)
            .with_request_timeout(config.request_timeout());

        let (rest_client, private_ws) = match config.credentials() {
            Some(credentials) => (
                rest_client.with_credentials(credentials),
                Some(
                    KrakenWebSocketClient::new(&config.auth_websocket_url, "private")
                        .with_heartbeat_interval(config.heartbeat_interval_seconds)
                        .with_request_timeout(config.request_timeout()),
                ),
            ),
            None => (rest_client, None),
        };

        Ok(Self {
            rest_client,
            public_ws,
            private_ws,
            token: RwLock::new(None),
            subscriptions: Mutex::new(HashMap::new()),
            next_subscription_id: AtomicU64::new(1),
        })
    }

    /// Get a reference to the REST client
    pub fn rest(&self) -> &KrakenRestClient {
        &self.rest_client
    }

    pub fn is_authenticated(&self) -> bool {
        self.private_ws.is_some()
    }

    fn private_session(&self) -> Result<(&KrakenWebSocketClient, String)> {
        let ws = self.private_ws.as_ref().ok_or_else(|| {
            TraderError::Authentication("API key and secret are required".to_string())
        })?;
        let token = self.token.read().clone().ok_or_else(|| {
            TraderError::Authentication("no session token, connect first".to_string())
        })?;
        Ok((ws, token))
    }

    fn track(&self, subscription: ActiveSubscription) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions.lock().insert(id, subscription);
        id
    }
}

#[async_trait]
impl ExchangeClient for KrakenClient {
    #[instrument(skip(self))]
    async fn connect(&self) -> Result<()> {
        self.public_ws.connect().await?;

        match &self.private_ws {
            Some(private_ws) => {
                let token = self.rest_client.get_websockets_token().await?;
                *self.token.write() = Some(token.token);
                private_ws.connect().await?;
            }
            None => warn!("No API credentials configured, balances and orders are unavailable"),
        }

        info!(authenticated = self.is_authenticated(), "Connected to Kraken");
        Ok(())
    }

    #[instrument(skip(self, sender))]
    async fn subscribe_balances(&self, sender: EventSender) -> Result<SubscriptionId> {
        let (ws, token) = self.private_session()?;
        ws.subscribe(
            BALANCES_ROUTE.to_string(),
            SubscriptionParams::balances(&token),
            sender,
        )
        .await?;
        Ok(self.track(ActiveSubscription::Balances))
    }

    #[instrument(skip(self, sender))]
    async fn subscribe_ticker(&self, symbol: &str, sender: EventSender) -> Result<SubscriptionId> {
        SymbolPair::parse(symbol)?;
        self.public_ws
            .subscribe(ticker_route(symbol), SubscriptionParams::ticker(symbol), sender)
            .await?;
        Ok(self.track(ActiveSubscription::Ticker(symbol.to_string())))
    }

    #[instrument(skip(self))]
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let subscription = self.subscriptions.lock().remove(&id);
        match subscription {
            Some(ActiveSubscription::Ticker(symbol)) => {
                self.public_ws
                    .unsubscribe(&ticker_route(&symbol), SubscriptionParams::ticker(&symbol))
                    .await
            }
            Some(ActiveSubscription::Balances) => {
                let (ws, token) = self.private_session()?;
                ws.unsubscribe(BALANCES_ROUTE, SubscriptionParams::balances(&token))
                    .await
            }
            None => {
                debug!(subscription = %id, "unknown subscription, nothing to cancel");
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
    ) -> Result<OrderReceipt> {
        let (ws, token) = self.private_session()?;
        let response = ws
            .request(
                "add_order",
                Some(AddOrderParams::market(symbol, side, amount, &token)),
            )
            .await?;

        let result: AddOrderResult = response
            .result
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| TraderError::InvalidResponse("add_order returned no result".to_string()))?;

        Ok(OrderReceipt {
            order_ids: vec![result.order_id],
            symbol: symbol.to_string(),
            side,
            amount,
            description: Some(format!("{} {} {} @ market", side, amount, symbol)),
            placed_at: chrono::Utc::now(),
            simulated: false,
        })
    }

    #[instrument(skip(self))]
    async fn disconnect(&self) -> Result<()> {
        self.public_ws.close().await;
        if let Some(private_ws) = &self.private_ws {
            private_ws.close().await;
        }
        *self.token.write() = None;
        self.subscriptions.lock().clear();
        info!("Disconnected from Kraken");
        Ok(())
    }

    fn exchange_name(&self) -> &'static str {
        "kraken"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::channels::create_event_channel;
    use rust_decimal_macros::dec;

    #[test]
    fn test_client_creation() {
        let client = KrakenClient::new(KrakenConfig::default()).unwrap();
        assert!(!client.is_authenticated());
        assert_eq!(client.exchange_name(), "kraken");
    }

    #[test]
    fn test_credentials_enable_private_socket() {
        let config = KrakenConfig {
            api_key: Some("key".to_string()),
            api_secret: Some("c2VjcmV0".to_string()),
            ..KrakenConfig::default()
        };
        let client = KrakenClient::new(config).unwrap();
        assert!(client.is_authenticated());
        assert!(client.rest().has_credentials());
    }

    #[tokio::test]
    async fn test_private_calls_need_credentials() {
        let client = KrakenClient::new(KrakenConfig::default()).unwrap();
        let (tx, _rx) = create_event_channel();

        assert!(matches!(
            client.subscribe_balances(tx).await,
            Err(TraderError::Authentication(_))
        ));
        assert!(matches!(
            client.place_market_order("BTC/USD", Side::Buy, dec!(1)).await,
            Err(TraderError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_ticker_symbol_is_validated_before_sending() {
        let client = KrakenClient::new(KrakenConfig::default()).unwrap();
        let (tx, _rx) = create_event_channel();

        assert!(matches!(
            client.subscribe_ticker("XBTUSD", tx).await,
            Err(TraderError::InvalidSymbol(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_subscription_is_noop() {
        let client = KrakenClient::new(KrakenConfig::default()).unwrap();
        assert!(client.unsubscribe(SubscriptionId(42)).await.is_ok());
    }
}
