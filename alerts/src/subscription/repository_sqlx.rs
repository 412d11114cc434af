use anyhow::Context;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};

use crate::subscription::model::{Fingerprint, PushSubscription};
use crate::subscription::repository::SubscriptionRepository;

/// SQLx-backed implementation of SubscriptionRepository.
/// Responsible only for persistence and row mapping.
pub struct SqlxSubscriptionRepository {
    pool: AnyPool,
}

impl SqlxSubscriptionRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SqlxSubscriptionRepository {
    async fn exists(&self, fingerprint: &Fingerprint) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM subscriptions WHERE sub_hash = ?;")
            .bind(fingerprint.as_str().to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn add(
        &self,
        fingerprint: &Fingerprint,
        subscription: &PushSubscription,
    ) -> anyhow::Result<bool> {
        let body = serde_json::to_string(subscription).context("serialize subscription")?;

        let res = sqlx::query(
            r#"
INSERT INTO subscriptions (sub_hash, subscription)
VALUES (?, ?)
ON CONFLICT (sub_hash) DO NOTHING;
"#,
        )
        .bind(fingerprint.as_str().to_string())
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn remove(&self, fingerprint: &Fingerprint) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM subscriptions WHERE sub_hash = ?;")
            .bind(fingerprint.as_str().to_string())
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<PushSubscription>> {
        let rows = sqlx::query("SELECT sub_hash, subscription FROM subscriptions;")
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            let raw: String = r.get("subscription");
            match serde_json::from_str::<PushSubscription>(&raw) {
                Ok(sub) => out.push(sub),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the broadcast
                    let sub_hash: String = r.get("sub_hash");
                    tracing::warn!(error = %e, sub_hash = %sub_hash, "skipping malformed subscription row");
                }
            }
        }

        Ok(out)
    }
}
