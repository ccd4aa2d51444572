//! Trackfolio - investment portfolio tracker
//!
//! This library provides the holdings store, a simulated market quote feed,
//! and the portfolio statistics (totals, performers, allocation, rebalancing
//! and performance history) computed from them.

pub mod config;
pub mod db;
pub mod error;
pub mod importers;
pub mod market;
pub mod reports;
pub mod session;
pub mod utils;
