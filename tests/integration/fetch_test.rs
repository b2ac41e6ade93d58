//! End-to-end trade fetching and resampling over HTTP

use chrono::{DateTime, Duration, Utc};
use poloniex_bundle::api::{ClientConfig, Pair, PoloniexClient, RetryPolicy};
use poloniex_bundle::candle::Resampler;
use poloniex_bundle::history::{FetchError, FetcherConfig, TradeHistoryFetcher};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::{
    matchers::{method, query_param},
    Mock, MockServer, ResponseTemplate,
};

async fn setup(trade_limit: usize) -> (MockServer, TradeHistoryFetcher<PoloniexClient>) {
    let mock_server = MockServer::start().await;
    let client = PoloniexClient::with_config(ClientConfig {
        base_url: format!("{}/public", mock_server.uri()),
        trade_limit,
        max_calls: 100,
        ..Default::default()
    })
    .unwrap();
    let config = FetcherConfig {
        retry: RetryPolicy {
            initial_backoff: std::time::Duration::from_millis(1),
            max_backoff: std::time::Duration::from_millis(10),
            multiplier: 2,
            max_retries: 3,
        },
        ..Default::default()
    };
    (mock_server, TradeHistoryFetcher::with_config(client, config))
}

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1451606400, 0).unwrap()
}

fn eth() -> Pair {
    "USDT_ETH".parse().unwrap()
}

fn trade_json(id: u64, date: &str, rate: &str, amount: &str) -> serde_json::Value {
    json!({
        "globalTradeID": id,
        "tradeID": id,
        "date": date,
        "type": "buy",
        "rate": rate,
        "amount": amount,
        "total": "0"
    })
}

#[tokio::test]
async fn test_usdt_eth_minute_bar() {
    let (mock_server, fetcher) = setup(50_000).await;

    Mock::given(method("GET"))
        .and(query_param("command", "returnTradeHistory"))
        .and(query_param("currencyPair", "USDT_ETH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            trade_json(3, "2016-01-01 00:00:40", "11", "1"),
            trade_json(2, "2016-01-01 00:00:20", "12", "2"),
            trade_json(1, "2016-01-01 00:00:05", "10", "1"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let end = t0() + Duration::minutes(10);
    let trades = fetcher.fetch(&eth(), t0(), end).await.unwrap();
    let set = Resampler::default().resample(&trades, t0(), end);

    let traded: Vec<_> = set.traded().collect();
    assert_eq!(traded.len(), 1);
    let bar = traded[0];
    assert_eq!(bar.start, t0());
    assert_eq!(bar.open, Some(dec!(10)));
    assert_eq!(bar.high, Some(dec!(12)));
    assert_eq!(bar.low, Some(dec!(10)));
    assert_eq!(bar.close, Some(dec!(11)));
    assert_eq!(bar.volume, dec!(4));
    assert_eq!(set.len(), 10);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let (mock_server, fetcher) = setup(50_000).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([trade_json(
            1,
            "2016-01-01 00:00:05",
            "10",
            "1"
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let trades = fetcher
        .fetch(&eth(), t0(), t0() + Duration::minutes(1))
        .await
        .unwrap();

    assert_eq!(trades.len(), 1);
}

#[tokio::test]
async fn test_logical_error_is_not_retried() {
    let (mock_server, fetcher) = setup(50_000).await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid currency pair."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = fetcher.fetch(&eth(), t0(), t0() + Duration::minutes(1)).await;

    assert!(matches!(result, Err(FetchError::Api(_))));
}

#[tokio::test]
async fn test_overflowing_window_is_split() {
    let (mock_server, fetcher) = setup(2).await;

    // Whole window: the page is full
    Mock::given(method("GET"))
        .and(query_param("start", "1451606400"))
        .and(query_param("end", "1451606999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            trade_json(2, "2016-01-01 00:07:00", "12", "1"),
            trade_json(1, "2016-01-01 00:01:00", "10", "1"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    // First half
    Mock::given(method("GET"))
        .and(query_param("start", "1451606400"))
        .and(query_param("end", "1451606699"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([trade_json(
            1,
            "2016-01-01 00:01:00",
            "10",
            "1"
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;
    // Second half
    Mock::given(method("GET"))
        .and(query_param("start", "1451606700"))
        .and(query_param("end", "1451606999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([trade_json(
            2,
            "2016-01-01 00:07:00",
            "12",
            "1"
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let trades = fetcher
        .fetch(&eth(), t0(), t0() + Duration::minutes(10))
        .await
        .unwrap();

    let ids: Vec<u64> = trades.iter().map(|t| t.global_trade_id).collect();
    assert_eq!(ids, vec![1, 2]);
}
