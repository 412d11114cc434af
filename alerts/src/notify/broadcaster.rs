use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{error, info, instrument, warn};

use crate::notify::{
    DeliveryError, DeliveryReport, NotificationPayload, PushDelivery, SignalAlert, SignalNotifier,
};
use crate::subscription::SubscriptionRepository;

/// Fans an alert out to every stored subscriber.
///
/// Recipients are independent: one failed delivery never prevents attempts to
/// the others. Subscriptions reported as expired by the push service are
/// removed from the store.
pub struct Broadcaster {
    subscriptions: Arc<dyn SubscriptionRepository>,
    delivery: Arc<dyn PushDelivery>,
    notification_url: String,
}

impl Broadcaster {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        delivery: Arc<dyn PushDelivery>,
        notification_url: String,
    ) -> Self {
        Self {
            subscriptions,
            delivery,
            notification_url,
        }
    }
}

#[async_trait]
impl SignalNotifier for Broadcaster {
    #[instrument(
        skip_all,
        target = "notify",
        fields(direction = %alert.direction, ts_ms = alert.timestamp_ms)
    )]
    async fn notify(&self, alert: &SignalAlert) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let recipients = match self.subscriptions.list_all().await {
            Ok(r) => r,
            Err(e) => {
                error!(error = ?e, "failed to list subscribers; alert not delivered");
                return report;
            }
        };

        let payload = NotificationPayload::from_alert(alert, &self.notification_url);
        report.attempted = recipients.len();

        let results = join_all(
            recipients
                .iter()
                .map(|r| self.delivery.deliver(r, &payload)),
        )
        .await;

        for (recipient, result) in recipients.iter().zip(results) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(DeliveryError::Expired { status }) => {
                    report.failed += 1;
                    let fingerprint = recipient.fingerprint();
                    match self.subscriptions.remove(&fingerprint).await {
                        Ok(true) => {
                            report.pruned += 1;
                            info!(fingerprint = %fingerprint, status, "pruned expired subscription");
                        }
                        Ok(false) => {}
                        Err(e) => {
                            warn!(error = ?e, fingerprint = %fingerprint, "failed to prune expired subscription")
                        }
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(error = %e, endpoint = %recipient.endpoint, "push delivery failed");
                }
            }
        }

        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            body = %payload.body,
            "alert broadcast"
        );

        report
    }
}
