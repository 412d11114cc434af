use anyhow::Result;
use async_trait::async_trait;

use crate::subscription::model::{Fingerprint, PushSubscription};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool>;

    /// Returns `false` when a record with this fingerprint already existed.
    async fn add(&self, fingerprint: &Fingerprint, subscription: &PushSubscription)
    -> Result<bool>;

    /// Returns `false` when nothing was stored under this fingerprint.
    async fn remove(&self, fingerprint: &Fingerprint) -> Result<bool>;

    async fn list_all(&self) -> Result<Vec<PushSubscription>>;
}
