use serde::{Deserialize, Serialize};

// Net holding of one asset, derived from the transaction log on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub asset: String,
    pub net_quantity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionsResponse {
    pub positions: Vec<Position>,
    pub total_deposits: f64,
}
