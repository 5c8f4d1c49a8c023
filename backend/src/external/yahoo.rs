use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use crate::external::price_provider::{ExternalPricePoint, PriceProvider};
use crate::external::ProviderError;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, base_url: CHART_URL.to_string() }
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Smallest chart range that covers `days` daily bars.
fn range_for_days(days: u32) -> &'static str {
    match days {
        0..=5 => "5d",
        6..=25 => "1mo",
        26..=85 => "3mo",
        86..=175 => "6mo",
        176..=360 => "1y",
        _ => "2y",
    }
}

fn parse_chart(body: YahooChartResponse, days: u32) -> Result<Vec<ExternalPricePoint>, ProviderError> {
    if let Some(err) = body.chart.error {
        return Err(if err.code.eq_ignore_ascii_case("Not Found") {
            ProviderError::NotFound(err.description)
        } else {
            ProviderError::BadResponse(format!("{}: {}", err.code, err.description))
        });
    }

    let result = body
        .chart
        .result
        .and_then(|mut r| r.pop())
        .ok_or_else(|| ProviderError::BadResponse("missing result".into()))?;

    // timestamp aligns with close list by index
    let closes = &result
        .indicators
        .quote
        .first()
        .ok_or_else(|| ProviderError::BadResponse("missing quote".into()))?
        .close;

    let mut out = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = closes.get(i).copied().flatten() else { continue };

        let dt = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| ProviderError::Parse(format!("bad timestamp {}", ts)))?;

        out.push(ExternalPricePoint { date: dt.date_naive(), close });
    }

    out.sort_by_key(|p| p.date);
    // intraday bar for today can duplicate the last daily bar
    out.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            earlier.close = later.close;
            true
        } else {
            false
        }
    });

    let keep = days as usize;
    if out.len() > keep {
        out.drain(..out.len() - keep);
    }
    Ok(out)
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, ProviderError> {
        let range = range_for_days(days);
        let url = format!("{}/{}?range={}&interval=1d", self.base_url, ticker, range);
        debug!("Fetching {} daily closes for {} (range {})", days, ticker, range);

        let resp = self.client.get(url).send().await?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => {
                return Err(ProviderError::NotFound(format!("unknown ticker {}", ticker)))
            }
            _ => {}
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_chart(body, days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> YahooChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_chart_skips_missing_closes_and_trims() {
        let body = chart(
            r#"{"chart":{"result":[{"timestamp":[1704067200,1704153600,1704240000,1704326400],
                "indicators":{"quote":[{"close":[42000.0,null,44000.0,45000.0]}]}}],"error":null}}"#,
        );

        let points = parse_chart(body, 2).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, 44000.0);
        assert_eq!(points[1].close, 45000.0);
        assert!(points[0].date < points[1].date);
    }

    #[test]
    fn test_parse_chart_reports_not_found() {
        let body = chart(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        assert!(matches!(parse_chart(body, 5), Err(ProviderError::NotFound(_))));
    }

    #[test]
    fn test_parse_chart_keeps_latest_bar_for_duplicate_dates() {
        let body = chart(
            r#"{"chart":{"result":[{"timestamp":[1704067200,1704070000],
                "indicators":{"quote":[{"close":[100.0,101.5]}]}}],"error":null}}"#,
        );
        let points = parse_chart(body, 5).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close, 101.5);
    }

    #[test]
    fn test_range_covers_regime_window() {
        assert_eq!(range_for_days(5), "5d");
        assert_eq!(range_for_days(31), "3mo");
        assert_eq!(range_for_days(250), "1y");
    }
}
