pub mod client;

pub use client::CoincheckClient;
