pub mod market_data;
pub mod message;
pub mod order;
pub mod stats;
