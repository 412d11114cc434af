//! Outbound notifications: payload, per-recipient delivery, broadcast.

pub mod broadcaster;
pub mod relay;

use async_trait::async_trait;
use market::Direction;
use serde::Serialize;
use thiserror::Error;

use crate::subscription::PushSubscription;

pub use broadcaster::Broadcaster;
pub use relay::RelayPushDelivery;

/// A newly observed crossover that should reach subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalAlert {
    pub symbol: String,
    pub direction: Direction,
    pub price: f64,
    pub timestamp_ms: i64,
}

/// Body sent to each subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub timestamp: i64,
}

impl NotificationPayload {
    pub fn from_alert(alert: &SignalAlert, url: &str) -> Self {
        Self {
            title: format!("{} {} signal", alert.symbol.to_ascii_uppercase(), alert.direction),
            body: format!("{}, price: {}", alert.direction, alert.price),
            url: url.to_string(),
            timestamp: alert.timestamp_ms,
        }
    }
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The push service no longer knows this subscription.
    #[error("subscription expired (HTTP {status})")]
    Expired { status: u16 },

    #[error("push service rejected delivery (HTTP {status})")]
    Rejected { status: u16 },
}

/// Delivers one payload to one recipient. No retries.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn deliver(
        &self,
        recipient: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError>;
}

/// Outcome of fanning one alert out to every subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub pruned: usize,
}

/// Receives alerts from the pipeline.
#[async_trait]
pub trait SignalNotifier: Send + Sync {
    async fn notify(&self, alert: &SignalAlert) -> DeliveryReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_body_matches_price_format() {
        let alert = SignalAlert {
            symbol: "btc-usd".into(),
            direction: Direction::Buy,
            price: 64_250.5,
            timestamp_ms: 1_700_000_000_000,
        };

        let p = NotificationPayload::from_alert(&alert, "https://alerts.example/");
        assert_eq!(p.title, "BTC-USD Buy signal");
        assert_eq!(p.body, "Buy, price: 64250.5");
        assert_eq!(p.url, "https://alerts.example/");
        assert_eq!(p.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn payload_serializes_flat() {
        let alert = SignalAlert {
            symbol: "eth-usd".into(),
            direction: Direction::Sell,
            price: 3000.0,
            timestamp_ms: 5,
        };

        let json = serde_json::to_value(NotificationPayload::from_alert(&alert, "/")).unwrap();
        assert_eq!(json["body"], "Sell, price: 3000");
        assert_eq!(json["timestamp"], 5);
    }
}
