use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::transaction_queries;
use crate::models::{CreateTransaction, Currency, ImportResult, NewTransaction, TransactionType};
use crate::services::transaction_service;

#[derive(Debug, Deserialize)]
struct CsvRow {
    asset: String,
    #[serde(rename = "type")]
    tx_type: String,
    quantity: String,
    unit_price: String,
    #[serde(default)]
    timestamp: Option<String>,
}

fn parse_number(raw: &str, field: &str) -> Result<f64> {
    let cleaned = raw.replace(',', "");
    cleaned
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid {} '{}'", field, raw))
}

fn parse_row(row: CsvRow, currency: Currency, factor: f64) -> Result<NewTransaction> {
    let tx_type: TransactionType = row.tx_type.parse().map_err(anyhow::Error::msg)?;
    let timestamp = match row.timestamp.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(ts) => Some(
            DateTime::parse_from_rfc3339(ts)
                .with_context(|| format!("invalid timestamp '{}'", ts))?
                .with_timezone(&Utc),
        ),
    };

    let input = CreateTransaction {
        asset: row.asset,
        tx_type,
        quantity: parse_number(&row.quantity, "quantity")?,
        unit_price: parse_number(&row.unit_price, "unit_price")?,
        currency,
        timestamp,
    };

    transaction_service::validate(input, factor).map_err(|e| anyhow::anyhow!(e.to_string()))
}

/// Parses every row; the result pairs valid rows with per-line error messages.
pub fn parse_csv(body: &str, currency: Currency, factor: f64) -> Result<(Vec<NewTransaction>, Vec<String>)> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers().context("CSV has no header row")?.clone();
    for required in ["asset", "type", "quantity", "unit_price"] {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(required)) {
            anyhow::bail!("CSV header is missing column '{}'", required);
        }
    }
    let lowered: csv::StringRecord = headers.iter().map(|h| h.to_lowercase()).collect();
    reader.set_headers(lowered);

    let mut valid = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let parsed = record
            .context("malformed row")
            .and_then(|row| parse_row(row, currency, factor));
        match parsed {
            Ok(tx) => valid.push(tx),
            Err(e) => {
                warn!("Skipping CSV line {}: {:#}", line, e);
                errors.push(format!("line {}: {:#}", line, e));
            }
        }
    }

    Ok((valid, errors))
}

pub async fn import_transactions(
    pool: &SqlitePool,
    body: &str,
    currency: Currency,
    factor: f64,
) -> Result<ImportResult> {
    let (rows, mut errors) = parse_csv(body, currency, factor)?;

    let mut imported = 0;
    for tx in rows {
        match transaction_queries::create(pool, &tx).await {
            Ok(_) => imported += 1,
            Err(e) => errors.push(format!("{} {:?}: {}", tx.asset, tx.tx_type, e)),
        }
    }

    info!("Imported {} transactions ({} rejected)", imported, errors.len());
    Ok(ImportResult { imported, errors })
}
