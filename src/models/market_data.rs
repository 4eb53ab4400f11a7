use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: String,
    pub timestamp: i64,
    pub price: f64,
    pub volume: f64,
    pub bid: f64,
    pub ask: f64,
}

impl MarketData {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: i64,
        price: f64,
        volume: f64,
        bid: f64,
        ask: f64,
    ) -> Self {
        MarketData {
            symbol: symbol.into(),
            timestamp,
            price,
            volume,
            bid,
            ask,
        }
    }

    pub fn mid(&self) -> f64 {
        if self.bid > 0.0 && self.ask > 0.0 {
            (self.bid + self.ask) / 2.0
        } else {
            self.price
        }
    }

    pub fn spread(&self) -> f64 {
        (self.ask - self.bid).max(0.0)
    }
}
