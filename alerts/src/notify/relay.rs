use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::notify::{DeliveryError, NotificationPayload, PushDelivery};
use crate::subscription::PushSubscription;

/// Hands each delivery to a Web Push relay.
///
/// The relay owns RFC 8291 payload encryption and VAPID signing and forwards
/// to the browser push service. This client never talks to a push service
/// endpoint directly; it POSTs the subscription and the plaintext payload to
/// `relay_url` with a `TTL` hint. The relay is expected to pass through the
/// push service status, so 404/410 still mean the subscription is gone.
#[derive(Clone)]
pub struct RelayPushDelivery {
    http: Client,
    relay_url: String,
    ttl_secs: u32,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    subscription: &'a PushSubscription,
    payload: &'a NotificationPayload,
}

impl RelayPushDelivery {
    pub fn new(
        relay_url: String,
        ttl_secs: u32,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            relay_url,
            ttl_secs,
        })
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    fn request(
        &self,
        recipient: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<Request, DeliveryError> {
        let req = self
            .http
            .post(&self.relay_url)
            .header("TTL", self.ttl_secs.to_string())
            .json(&RelayRequest {
                subscription: recipient,
                payload,
            })
            .build()?;

        Ok(req)
    }
}

#[async_trait]
impl PushDelivery for RelayPushDelivery {
    #[instrument(skip_all, fields(endpoint = %recipient.endpoint), level = "debug")]
    async fn deliver(
        &self,
        recipient: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let req = self.request(recipient, payload)?;
        let resp = self.http.execute(req).await?;

        classify(resp.status())?;

        debug!(status = resp.status().as_u16(), "push handed to relay");
        Ok(())
    }
}

fn classify(status: StatusCode) -> Result<(), DeliveryError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND | StatusCode::GONE => Err(DeliveryError::Expired {
            status: status.as_u16(),
        }),
        s => Err(DeliveryError::Rejected { status: s.as_u16() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionKeys;

    fn recipient() -> PushSubscription {
        PushSubscription {
            endpoint: "https://fcm.googleapis.com/fcm/send/abc".into(),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: "BNc".into(),
                auth: "tBH".into(),
            },
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title: "BTC-USD Buy signal".into(),
            body: "Buy, price: 64250.5".into(),
            url: "/".into(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn posts_to_relay_not_push_endpoint() {
        let relay = RelayPushDelivery::new(
            "http://relay.internal/send".into(),
            600,
            Duration::from_secs(5),
        )
        .unwrap();

        let req = relay.request(&recipient(), &payload()).unwrap();

        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.url().as_str(), "http://relay.internal/send");
        assert_eq!(req.headers()["TTL"], "600");

        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(
            json["subscription"]["endpoint"],
            "https://fcm.googleapis.com/fcm/send/abc"
        );
        assert_eq!(json["subscription"]["keys"]["auth"], "tBH");
        assert_eq!(json["payload"]["body"], "Buy, price: 64250.5");
    }

    #[test]
    fn status_classification() {
        assert!(classify(StatusCode::CREATED).is_ok());
        assert!(matches!(
            classify(StatusCode::GONE),
            Err(DeliveryError::Expired { status: 410 })
        ));
        assert!(matches!(
            classify(StatusCode::NOT_FOUND),
            Err(DeliveryError::Expired { status: 404 })
        ));
        assert!(matches!(
            classify(StatusCode::TOO_MANY_REQUESTS),
            Err(DeliveryError::Rejected { status: 429 })
        ));
    }
}
