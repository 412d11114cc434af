use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Push subscriptions, keyed by the SHA-256 of their auth secret
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS subscriptions (
  sub_hash TEXT PRIMARY KEY,
  subscription TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Last notified crossover per symbol
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS signal_state (
  symbol TEXT PRIMARY KEY,
  last_buy_ts_ms BIGINT NOT NULL,
  last_sell_ts_ms BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
