//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;

use super::types::MarketEvent;

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

/// Sending half handed to exchange clients on subscribe
pub type EventSender = mpsc::Sender<MarketEvent>;

/// Receiving half drained by the market feed
pub type EventReceiver = mpsc::Receiver<MarketEvent>;

/// Create a new market event channel with the default buffer size
pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}
