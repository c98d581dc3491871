pub mod orderbook;
pub mod pairs;
pub mod price_series;
pub mod ticker;

pub use orderbook::OrderBookSummary;
pub use price_series::{PriceHistoryStore, PriceSample, PriceSeries};
pub use ticker::{BookLevel, OrderBook, Ticker};
