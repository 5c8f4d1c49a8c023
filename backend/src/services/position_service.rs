use std::collections::BTreeMap;

use sqlx::SqlitePool;

use crate::db;
use crate::errors::AppError;
use crate::models::{Position, PositionsResponse, Transaction, TransactionType};

/// Net quantities at or below this are float residue from buy/sell round trips.
const DUST_THRESHOLD: f64 = 1e-12;

/// Reduces transactions into net holdings, sorted by asset.
///
/// Deposits are cash movements and never become positions. Only assets with
/// a net quantity above [`DUST_THRESHOLD`] are kept.
pub fn aggregate_positions(transactions: &[Transaction]) -> Vec<Position> {
    let mut net: BTreeMap<&str, f64> = BTreeMap::new();

    for tx in transactions {
        let signed = match tx.tx_type {
            TransactionType::Buy => tx.quantity,
            TransactionType::Sell => -tx.quantity,
            TransactionType::Deposit => continue,
        };
        *net.entry(tx.asset.as_str()).or_insert(0.0) += signed;
    }

    net.into_iter()
        .filter(|(_, qty)| *qty > DUST_THRESHOLD)
        .map(|(asset, net_quantity)| Position {
            asset: asset.to_string(),
            net_quantity,
        })
        .collect()
}

pub fn total_deposits(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.tx_type == TransactionType::Deposit)
        .map(|tx| tx.quantity)
        .sum()
}

pub async fn current_positions(pool: &SqlitePool) -> Result<PositionsResponse, AppError> {
    let transactions = db::transaction_queries::fetch_all(pool).await?;
    Ok(PositionsResponse {
        positions: aggregate_positions(&transactions),
        total_deposits: total_deposits(&transactions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tx(asset: &str, tx_type: TransactionType, quantity: f64, price: f64) -> Transaction {
        Transaction {
            id: 0,
            timestamp: Utc::now(),
            asset: asset.to_string(),
            tx_type,
            quantity,
            price,
        }
    }

    #[test]
    fn test_buy_and_sell_net_out() {
        let txs = vec![
            tx("BTC", TransactionType::Buy, 1.0, 50000.0),
            tx("BTC", TransactionType::Buy, 0.5, 60000.0),
            tx("BTC", TransactionType::Sell, 0.5, 55000.0),
        ];

        let positions = aggregate_positions(&txs);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].asset, "BTC");
        assert!((positions[0].net_quantity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_closed_and_oversold_positions_are_dropped() {
        let txs = vec![
            tx("ETH", TransactionType::Buy, 0.3, 3000.0),
            tx("ETH", TransactionType::Buy, 0.6, 3000.0),
            tx("ETH", TransactionType::Sell, 0.9, 3100.0),
            tx("SOL", TransactionType::Buy, 1.0, 100.0),
            tx("SOL", TransactionType::Sell, 2.0, 110.0),
            tx("ADA", TransactionType::Buy, 10.0, 0.5),
        ];

        let positions = aggregate_positions(&txs);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].asset, "ADA");
        assert!(positions.iter().all(|p| p.net_quantity > 0.0));
    }

    #[test]
    fn test_deposits_are_not_positions() {
        let txs = vec![
            tx("USD", TransactionType::Deposit, 1000.0, 1.0),
            tx("USD", TransactionType::Deposit, 500.0, 1.0),
            tx("BTC", TransactionType::Buy, 0.01, 60000.0),
        ];

        let positions = aggregate_positions(&txs);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].asset, "BTC");
        assert_eq!(total_deposits(&txs), 1500.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_positions(&[]).is_empty());
        assert_eq!(total_deposits(&[]), 0.0);
    }

    #[test]
    fn test_positions_sorted_by_asset() {
        let txs = vec![
            tx("SOL", TransactionType::Buy, 1.0, 100.0),
            tx("BTC", TransactionType::Buy, 1.0, 100.0),
            tx("ETH", TransactionType::Buy, 1.0, 100.0),
        ];
        let assets: Vec<String> = aggregate_positions(&txs).into_iter().map(|p| p.asset).collect();
        assert_eq!(assets, vec!["BTC", "ETH", "SOL"]);
    }
}
