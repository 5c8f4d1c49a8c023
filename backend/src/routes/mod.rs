pub mod allocations;
pub mod health;
pub mod journal;
pub mod market;
pub mod portfolio;
pub mod research;
pub mod sessions;
pub mod transactions;
pub mod wallets;
