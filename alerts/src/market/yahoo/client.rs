use std::time::Duration;

use async_trait::async_trait;
use market::{PricePoint, round_tenths};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::market::PriceSource;
use crate::market::errors::PriceSourceError;
use crate::market::yahoo::types::ChartResponse;

/// Intraday bars from Yahoo's v8 chart API.
#[derive(Clone)]
pub struct YahooPriceSource {
    http: Client,
    base_url: String,
    interval: String,
    range: String,
}

impl YahooPriceSource {
    pub fn new(
        base_url: String,
        interval: String,
        range: String,
        timeout: Duration,
    ) -> Result<Self, PriceSourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            interval,
            range,
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval={}&range={}",
            self.base_url, symbol, self.interval, self.range
        )
    }
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    #[instrument(skip(self), fields(interval = %self.interval, range = %self.range), level = "debug")]
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<PricePoint>, PriceSourceError> {
        let resp = self.http.get(self.chart_url(symbol)).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PriceSourceError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(PriceSourceError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let chart: ChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceSourceError::Malformed(format!("{symbol}: {e}")))?;

        let points = parse_chart(symbol, chart)?;

        debug!(
            points = points.len(),
            first_ts_ms = points.first().map(|p| p.timestamp_ms),
            last_ts_ms = points.last().map(|p| p.timestamp_ms),
            "price series fetched"
        );

        Ok(points)
    }
}

/// Converts a chart payload into price points.
///
/// Bars without a close are dropped. Missing open/high/low fall back to the
/// close. Prices are rounded to one decimal place and timestamps converted to
/// milliseconds.
pub fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<PricePoint>, PriceSourceError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => PriceSourceError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => PriceSourceError::Malformed(format!("{}: {}", err.code, err.description)),
        None => PriceSourceError::Malformed("empty result with no error".into()),
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| PriceSourceError::Malformed("result array is empty".into()))?;

    let timestamps = data
        .timestamp
        .ok_or_else(|| PriceSourceError::Malformed("no timestamps".into()))?;

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| PriceSourceError::Malformed("no quote data".into()))?;

    let mut points = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };

        if chrono::DateTime::from_timestamp(ts, 0).is_none() {
            return Err(PriceSourceError::Malformed(format!("invalid timestamp: {ts}")));
        }

        let pick = |col: &[Option<f64>]| col.get(i).copied().flatten().unwrap_or(close);

        points.push(PricePoint {
            timestamp_ms: ts * 1_000,
            open: round_tenths(pick(&quote.open)),
            high: round_tenths(pick(&quote.high)),
            low: round_tenths(pick(&quote.low)),
            close: round_tenths(close),
        });
    }

    if points.is_empty() {
        return Err(PriceSourceError::Malformed(format!(
            "no usable bars for {symbol}"
        )));
    }

    points.sort_by_key(|p| p.timestamp_ms);

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_bars_and_skips_missing_closes() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1700000000,1700000900,1700001800],
                "indicators":{"quote":[{
                    "open":[100.04,null,102.0],
                    "high":[101.0,null,103.26],
                    "low":[99.0,null,101.0],
                    "close":[100.56,null,102.44]
                }]}
            }],"error":null}}"#,
        );

        let points = parse_chart("btc-usd", resp).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(points[0].open, 100.0);
        assert_eq!(points[0].close, 100.6);
        assert_eq!(points[1].timestamp_ms, 1_700_001_800_000);
        assert_eq!(points[1].high, 103.3);
        assert_eq!(points[1].close, 102.4);
    }

    #[test]
    fn missing_ohl_fall_back_to_close() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1700000000],
                "indicators":{"quote":[{"close":[50.0]}]}
            }],"error":null}}"#,
        );

        let points = parse_chart("eth-usd", resp).unwrap();
        assert_eq!(points[0], PricePoint::flat(1_700_000_000_000, 50.0));
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let resp = chart(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        );

        let err = parse_chart("nope", resp).unwrap_err();
        assert!(matches!(err, PriceSourceError::SymbolNotFound { symbol } if symbol == "nope"));
    }

    #[test]
    fn all_null_closes_is_malformed() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1700000000,1700000900],
                "indicators":{"quote":[{"close":[null,null]}]}
            }],"error":null}}"#,
        );

        assert!(matches!(
            parse_chart("btc-usd", resp),
            Err(PriceSourceError::Malformed(_))
        ));
    }

    #[test]
    fn out_of_order_timestamps_are_sorted() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1700000900,1700000000],
                "indicators":{"quote":[{"close":[2.0,1.0]}]}
            }],"error":null}}"#,
        );

        let points = parse_chart("btc-usd", resp).unwrap();
        assert_eq!(points[0].close, 1.0);
        assert_eq!(points[1].close, 2.0);
    }

    #[test]
    fn chart_url_trims_trailing_slash() {
        let src = YahooPriceSource::new(
            "https://example.test/".into(),
            "15m".into(),
            "1mo".into(),
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            src.chart_url("btc-usd"),
            "https://example.test/v8/finance/chart/btc-usd?interval=15m&range=1mo"
        );
    }
}
