use std::sync::Arc;
use std::time::Duration;

use common::logger::warn_if_slow;
use thiserror::Error;
use tracing::{info, instrument};

use crate::subscription::model::PushSubscription;
use crate::subscription::repository::SubscriptionRepository;

const STORE_SLOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    NotSubscribed,
}

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("invalid subscription: {0}")]
    Invalid(&'static str),

    #[error("subscription store failure: {0:#}")]
    Store(anyhow::Error),
}

/// Idempotent subscribe/unsubscribe on top of a [`SubscriptionRepository`].
///
/// Every store call is awaited and its resolved result decides the outcome,
/// so a failed insert or delete is reported as [`SubscriptionError::Store`]
/// rather than passing silently as success.
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionService {
    pub fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip_all, target = "subscriptions")]
    pub async fn subscribe(
        &self,
        subscription: &PushSubscription,
    ) -> Result<SubscribeOutcome, SubscriptionError> {
        validate(subscription)?;
        let fingerprint = subscription.fingerprint();

        let exists = warn_if_slow("subscription_exists", STORE_SLOW, self.repo.exists(&fingerprint))
            .await
            .map_err(SubscriptionError::Store)?;

        if exists {
            info!(fingerprint = %fingerprint, "already subscribed");
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        let inserted = warn_if_slow(
            "subscription_add",
            STORE_SLOW,
            self.repo.add(&fingerprint, subscription),
        )
        .await
        .map_err(SubscriptionError::Store)?;

        if inserted {
            info!(fingerprint = %fingerprint, "subscribed");
            Ok(SubscribeOutcome::Subscribed)
        } else {
            // lost a race with a concurrent subscribe of the same secret
            Ok(SubscribeOutcome::AlreadySubscribed)
        }
    }

    #[instrument(skip_all, target = "subscriptions")]
    pub async fn unsubscribe(
        &self,
        subscription: &PushSubscription,
    ) -> Result<UnsubscribeOutcome, SubscriptionError> {
        validate(subscription)?;
        let fingerprint = subscription.fingerprint();

        let exists = warn_if_slow("subscription_exists", STORE_SLOW, self.repo.exists(&fingerprint))
            .await
            .map_err(SubscriptionError::Store)?;

        if !exists {
            info!(fingerprint = %fingerprint, "not subscribed; nothing to remove");
            return Ok(UnsubscribeOutcome::NotSubscribed);
        }

        let removed = warn_if_slow(
            "subscription_remove",
            STORE_SLOW,
            self.repo.remove(&fingerprint),
        )
        .await
        .map_err(SubscriptionError::Store)?;

        if removed {
            info!(fingerprint = %fingerprint, "unsubscribed");
            Ok(UnsubscribeOutcome::Unsubscribed)
        } else {
            Ok(UnsubscribeOutcome::NotSubscribed)
        }
    }

    pub async fn list(&self) -> Result<Vec<PushSubscription>, SubscriptionError> {
        self.repo.list_all().await.map_err(SubscriptionError::Store)
    }
}

fn validate(subscription: &PushSubscription) -> Result<(), SubscriptionError> {
    if subscription.keys.auth.trim().is_empty() {
        return Err(SubscriptionError::Invalid("missing keys.auth"));
    }
    if subscription.endpoint.trim().is_empty() {
        return Err(SubscriptionError::Invalid("missing endpoint"));
    }
    Ok(())
}
