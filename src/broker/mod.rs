//! 실시간 분산 브로커의 핵심 구현체

pub mod aggregator;
pub mod channel;
pub mod connection;
pub mod stream_broker;

pub use aggregator::DataAggregator;
pub use stream_broker::StreamBroker;
