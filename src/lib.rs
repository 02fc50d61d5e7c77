//! Client library for the Stock-A-Future market data API.
//!
//! [`client::StockApiClient`] wraps the HTTP endpoints, [`demo::DemoRunner`]
//! drives the demonstration sequence and [`report`] renders the results.

pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod models;
pub mod report;
pub mod utils;

pub use client::{ClientConfig, StockApiClient};
pub use config::AppConfig;
pub use demo::{DemoRunner, RunOutcome};
pub use error::ClientError;
