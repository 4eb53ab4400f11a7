/**
* filename : main
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::json;

use xStream::broker::{DataAggregator, StreamBroker};
use xStream::config::Config;
use xStream::execution::scheduler::EXECUTIONS_CHANNEL;
use xStream::execution::{ExecutionScheduler, ImpactFillModel};
use xStream::models::market_data::MarketData;
use xStream::models::message::MessagePriority;
use xStream::models::order::{ExecutionParams, OrderSide};
use xStream::utils::{current_timestamp_ms, logging};

const MARKET_CHANNEL: &str = "market:BTCUSDT";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // 설정 로드
    let config = Config::load()?;

    // 로깅 초기화
    logging::init(&config.logging.level)?;
    log::info!("스트림 브로커 시작... (v{})", xStream::VERSION);

    // 브로커 / 집계기 / 스케줄러 조립
    let broker = Arc::new(StreamBroker::new(config.broker.clone()));
    let aggregator = Arc::new(DataAggregator::new(broker.clone(), config.aggregator.clone()));
    let scheduler = Arc::new(
        ExecutionScheduler::new(
            config.execution.clone(),
            Box::new(ImpactFillModel::new(&config.execution)),
        )
        .with_broker(broker.clone()),
    );

    let aggregator_handle = aggregator.clone().run();

    // 데모 구독자 등록
    broker.register("demo-client").await;
    broker.subscribe("demo-client", MARKET_CHANNEL, false).await;
    broker.subscribe("demo-client", EXECUTIONS_CHANNEL, false).await;

    // 합성 시세 피드
    run_synthetic_feed(&broker, &aggregator, &scheduler, 30).await;

    // TWAP 집행 데모
    let result = scheduler
        .execute_named(
            "demo-twap-1",
            "BTCUSDT",
            OrderSide::Buy,
            10_000,
            "TWAP",
            30,
            50_000.0,
            ExecutionParams::default(),
        )
        .await;
    log::info!(
        "TWAP 집행 결과: 체결 {}/{} 평균가 {:.2} 슬리피지 {:.2}bps",
        result.executed_quantity,
        result.requested_quantity,
        result.average_price,
        result.slippage_bps
    );

    // VWAP 집행 데모 - 피드에서 수집한 샘플 기반
    let result = scheduler
        .execute_named(
            "demo-vwap-1",
            "BTCUSDT",
            OrderSide::Sell,
            5_000,
            "VWAP",
            15,
            50_000.0,
            ExecutionParams::default(),
        )
        .await;
    log::info!(
        "VWAP 집행 결과: 슬라이스 {}/{} 성공 여부 {}",
        result.slices_executed,
        result.slices_total,
        result.success
    );

    // 구독자 큐 소비
    let messages = broker.poll("demo-client", 100).await;
    log::info!("demo-client 수신 메시지: {}건", messages.len());
    for message in messages.iter().take(5) {
        log::info!("  [{:?}] {} - {}", message.priority, message.channel, message.payload);
    }

    aggregator.flush_all().await;

    let stats = broker.stats().await;
    log::info!(
        "브로커 통계: 연결 {} 채널 {} 전송 {} 드랍 {} 백프레셔 {}",
        stats.active_connections,
        stats.active_channels,
        stats.global.messages_sent,
        stats.global.messages_dropped,
        stats.global.backpressure_events
    );

    let exec_stats = scheduler.stats();
    log::info!(
        "스케줄러 통계: 집행 {} 완료 {} 슬라이스 {} 총 체결량 {}",
        exec_stats.orders_executed,
        exec_stats.orders_completed,
        exec_stats.slices_simulated,
        exec_stats.total_executed_quantity
    );

    aggregator_handle.abort();
    broker.unregister("demo-client").await;
    log::info!("종료");

    Ok(())
}

/// 랜덤워크 합성 시세를 브로커/집계기/스케줄러에 공급
async fn run_synthetic_feed(
    broker: &Arc<StreamBroker>,
    aggregator: &Arc<DataAggregator>,
    scheduler: &Arc<ExecutionScheduler>,
    ticks: usize,
) {
    let mut price = 50_000.0;

    for _ in 0..ticks {
        let (delta, volume) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(-20.0..20.0), rng.gen_range(1.0..50.0))
        };
        price += delta;

        let sample = MarketData::new(
            "BTCUSDT",
            current_timestamp_ms(),
            price,
            volume,
            price - 0.5,
            price + 0.5,
        );

        broker
            .broadcast(
                MARKET_CHANNEL,
                json!({
                    "symbol": sample.symbol,
                    "price": sample.price,
                    "volume": sample.volume,
                }),
                MessagePriority::Normal,
                Some(10),
            )
            .await;

        let _ = aggregator
            .push(MARKET_CHANNEL, json!({"price": sample.price, "volume": sample.volume}))
            .await;

        scheduler.record_market_data(sample).await;

        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
