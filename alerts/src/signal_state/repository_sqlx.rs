use anyhow::Result;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};

use super::{DedupState, SignalStateStore};

/// SQLx-backed state store; one `signal_state` row per symbol.
pub struct SqlxSignalStateStore {
    pool: AnyPool,
    symbol: String,
}

impl SqlxSignalStateStore {
    pub fn new(pool: AnyPool, symbol: impl Into<String>) -> Self {
        Self {
            pool,
            symbol: symbol.into(),
        }
    }
}

#[async_trait]
impl SignalStateStore for SqlxSignalStateStore {
    async fn load(&self) -> Result<Option<DedupState>> {
        let row = sqlx::query(
            r#"
SELECT last_buy_ts_ms, last_sell_ts_ms
FROM signal_state
WHERE symbol = ?;
"#,
        )
        .bind(self.symbol.clone())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            DedupState::new(
                r.get::<i64, _>("last_buy_ts_ms"),
                r.get::<i64, _>("last_sell_ts_ms"),
            )
        }))
    }

    async fn save(&self, state: &DedupState) -> Result<()> {
        sqlx::query(
            r#"
INSERT INTO signal_state (symbol, last_buy_ts_ms, last_sell_ts_ms)
VALUES (?, ?, ?)
ON CONFLICT (symbol) DO UPDATE SET
  last_buy_ts_ms = excluded.last_buy_ts_ms,
  last_sell_ts_ms = excluded.last_sell_ts_ms;
"#,
        )
        .bind(self.symbol.clone())
        .bind(state.last_buy_ts_ms)
        .bind(state.last_sell_ts_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
