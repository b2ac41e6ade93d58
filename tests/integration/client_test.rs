//! Integration tests for the Poloniex client against a mock HTTP server

use chrono::{DateTime, Duration, Utc};
use poloniex_bundle::api::{ApiError, ClientConfig, ConfigError, Pair, PoloniexClient, Side};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// Start a mock server and a client whose base URL points at it
async fn setup(trade_limit: usize) -> (MockServer, PoloniexClient) {
    let mock_server = MockServer::start().await;
    let config = ClientConfig {
        base_url: format!("{}/public", mock_server.uri()),
        timeout: std::time::Duration::from_secs(5),
        trade_limit,
        max_calls: 100,
        rate_window: std::time::Duration::from_secs(1),
    };
    let client = PoloniexClient::with_config(config).unwrap();
    (mock_server, client)
}

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1451606400, 0).unwrap()
}

fn eth() -> Pair {
    "USDT_ETH".parse().unwrap()
}

fn trade_json(id: u64, date: &str, kind: &str, rate: &str, amount: &str) -> serde_json::Value {
    json!({
        "globalTradeID": id,
        "tradeID": id.to_string(),
        "date": date,
        "type": kind,
        "rate": rate,
        "amount": amount,
        "total": "0"
    })
}

#[tokio::test]
async fn test_trade_history_half_open_and_sorted() {
    let (mock_server, client) = setup(50_000).await;

    // Poloniex answers newest first
    Mock::given(method("GET"))
        .and(path("/public"))
        .and(query_param("command", "returnTradeHistory"))
        .and(query_param("currencyPair", "USDT_ETH"))
        .and(query_param("start", "1451606400"))
        .and(query_param("end", "1451606999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            trade_json(3, "2016-01-01 00:00:40", "sell", "11", "1"),
            trade_json(2, "2016-01-01 00:00:20", "buy", "12", "2"),
            trade_json(1, "2016-01-01 00:00:05", "buy", "10", "1"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let trades = client
        .get_trade_history(&eth(), t0(), t0() + Duration::minutes(10))
        .await
        .unwrap();

    let ids: Vec<u64> = trades.iter().map(|t| t.global_trade_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(trades[0].timestamp, t0() + Duration::seconds(5));
    assert_eq!(trades[0].side, Side::Buy);
    assert_eq!(trades[1].amount, dec!(2));
    assert_eq!(trades[2].trade_id, 3);
}

#[tokio::test]
async fn test_trade_history_fractional_end_includes_last_second() {
    let (mock_server, client) = setup(50_000).await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .and(query_param("command", "returnTradeHistory"))
        .and(query_param("start", "1451606400"))
        .and(query_param("end", "1451606410"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            trade_json(2, "2016-01-01 00:00:10", "sell", "11", "1"),
            trade_json(1, "2016-01-01 00:00:03", "buy", "10", "1"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let end = t0() + Duration::seconds(10) + Duration::milliseconds(500);
    let trades = client.get_trade_history(&eth(), t0(), end).await.unwrap();

    let ids: Vec<u64> = trades.iter().map(|t| t.global_trade_id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_error_object_is_request_error() {
    let (mock_server, client) = setup(50_000).await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid currency pair."})),
        )
        .mount(&mock_server)
        .await;

    let result = client
        .get_trade_history(&"USDT_NOPE".parse().unwrap(), t0(), t0() + Duration::hours(1))
        .await;

    match result {
        Err(ApiError::Request(message)) => assert_eq!(message, "Invalid currency pair."),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_status() {
    let (mock_server, client) = setup(50_000).await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let err = client.get_currencies().await.unwrap_err();

    match &err {
        ApiError::Status { status, body } => {
            assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_full_page_is_trades_exceeded() {
    let (mock_server, client) = setup(3).await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .and(query_param("command", "returnTradeHistory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            trade_json(3, "2016-01-01 00:00:03", "buy", "1", "1"),
            trade_json(2, "2016-01-01 00:00:02", "buy", "1", "1"),
            trade_json(1, "2016-01-01 00:00:01", "buy", "1", "1"),
        ])))
        .mount(&mock_server)
        .await;

    let result = client
        .get_trade_history(&eth(), t0(), t0() + Duration::hours(1))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::TradesExceeded { count: 3, limit: 3 })
    ));
}

#[tokio::test]
async fn test_invalid_period_sends_nothing() {
    let (mock_server, client) = setup(50_000).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = client
        .get_chart_data(&eth(), t0(), t0() + Duration::days(1), 60)
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Config(ConfigError::InvalidPeriod(60)))
    ));
}

#[tokio::test]
async fn test_chart_data() {
    let (mock_server, client) = setup(50_000).await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .and(query_param("command", "returnChartData"))
        .and(query_param("period", "300"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "date": 1451606400,
                "high": 0.95,
                "low": 0.93,
                "open": 0.94,
                "close": 0.95,
                "volume": 120.5,
                "quoteVolume": 128.1,
                "weightedAverage": 0.9406
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let candles = client
        .get_chart_data(&eth(), t0(), t0() + Duration::hours(1), 300)
        .await
        .unwrap();

    assert_eq!(candles.len(), 1);
    assert_eq!(candles[0].date, t0());
    assert_eq!(candles[0].high, dec!(0.95));
    assert_eq!(candles[0].weighted_average, dec!(0.9406));
}

#[tokio::test]
async fn test_chart_data_placeholder_row_dropped() {
    let (mock_server, client) = setup(50_000).await;

    Mock::given(method("GET"))
        .and(query_param("command", "returnChartData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "date": 0, "high": 0, "low": 0, "open": 0, "close": 0,
            "volume": 0, "quoteVolume": 0, "weightedAverage": 0
        }])))
        .mount(&mock_server)
        .await;

    let candles = client
        .get_chart_data(&eth(), t0(), t0() + Duration::hours(1), 1800)
        .await
        .unwrap();

    assert!(candles.is_empty());
}

#[tokio::test]
async fn test_currencies() {
    let (mock_server, client) = setup(50_000).await;

    Mock::given(method("GET"))
        .and(query_param("command", "returnCurrencies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ETH": {
                "id": 267,
                "name": "Ethereum",
                "txFee": "0.01000000",
                "minConf": 35,
                "depositAddress": null,
                "disabled": 0,
                "delisted": 0,
                "frozen": 0
            },
            "XYZ": {
                "id": 999,
                "name": "Gone",
                "disabled": 1,
                "delisted": 1,
                "frozen": 0
            }
        })))
        .mount(&mock_server)
        .await;

    let currencies = client.get_currencies().await.unwrap();

    assert_eq!(currencies.len(), 2);
    assert_eq!(currencies["ETH"].name, "Ethereum");
    assert!(!currencies["ETH"].disabled);
    assert!(currencies["XYZ"].delisted);
}
