//! Bundle ingestion into Parquet against a mock exchange

use chrono::{DateTime, Duration, Utc};
use poloniex_bundle::api::{ClientConfig, Pair, PoloniexClient, RetryPolicy};
use poloniex_bundle::candle::Resampler;
use poloniex_bundle::data::{read_assets, ParquetAssetWriter, ParquetBarReader, ParquetBarWriter};
use poloniex_bundle::history::{FetcherConfig, TradeHistoryFetcher};
use poloniex_bundle::ingest::{Bundle, IngestContext, IngestError, Ingestor, MemoryCache};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1451606400, 0).unwrap()
}

fn eth() -> Pair {
    "USDT_ETH".parse().unwrap()
}

async fn mock_exchange() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("command", "returnCurrencies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ETH": {"id": 267, "name": "Ethereum", "disabled": 0, "delisted": 0, "frozen": 0},
            "BTC": {"id": 28, "name": "Bitcoin", "disabled": 0, "delisted": 0, "frozen": 0}
        })))
        .mount(&mock_server)
        .await;

    mock_server
}

fn client(mock_server: &MockServer) -> Arc<PoloniexClient> {
    let config = ClientConfig {
        base_url: format!("{}/public", mock_server.uri()),
        max_calls: 100,
        ..Default::default()
    };
    Arc::new(PoloniexClient::with_config(config).unwrap())
}

fn ingestor(client: Arc<PoloniexClient>) -> Ingestor<Arc<PoloniexClient>> {
    let config = FetcherConfig {
        retry: RetryPolicy::none(),
        ..Default::default()
    };
    let fetcher = TradeHistoryFetcher::with_config(client, config);
    Ingestor::new(fetcher, Resampler::default(), 1).unwrap()
}

#[tokio::test]
async fn test_ingest_writes_assets_and_daily_bars() {
    let mock_server = mock_exchange().await;
    Mock::given(method("GET"))
        .and(query_param("command", "returnTradeHistory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"globalTradeID": 2, "tradeID": 2, "date": "2016-01-01 00:00:20",
             "type": "sell", "rate": "12", "amount": "2", "total": "24"},
            {"globalTradeID": 1, "tradeID": 1, "date": "2016-01-01 00:00:05",
             "type": "buy", "rate": "10", "amount": "1", "total": "10"}
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let ingestor = ingestor(client.clone());
    let temp_dir = TempDir::new().unwrap();
    let bundle = Bundle::new(vec![eth()]).with_range(Some(t0()), Some(t0() + Duration::days(2)));

    let mut asset_writer = ParquetAssetWriter::new(temp_dir.path().to_path_buf());
    let mut bar_writer = ParquetBarWriter::new(temp_dir.path().to_path_buf());
    let mut cache = MemoryCache::new();
    let ctx = IngestContext {
        asset_writer: &mut asset_writer,
        bar_writer: &mut bar_writer,
        cache: &mut cache,
        sessions: t0()..t0() + Duration::days(30),
        show_progress: false,
    };

    let assets = bundle.ingest(client.as_ref(), &ingestor, ctx).await.unwrap();
    assert_eq!(assets.len(), 1);

    let records = read_assets(&asset_writer.path()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].symbol, "ETH");
    assert_eq!(records[0].asset_name, "Ethereum");
    assert_eq!(records[0].exchange, "POLONIEX");

    let day1 = ParquetBarReader::new(temp_dir.path().join("0_20160101.parquet"))
        .read_bars()
        .unwrap();
    assert_eq!(day1.len(), 1440);
    assert_eq!(day1[0].open, Some(dec!(10)));
    assert_eq!(day1[0].close, Some(dec!(12)));
    assert_eq!(day1[0].volume, dec!(3));
    assert!(day1[1].is_empty());

    // The mock returns day-one trades for every window; they are dropped on day two
    let day2 = ParquetBarReader::new(temp_dir.path().join("0_20160102.parquet"))
        .read_bars()
        .unwrap();
    assert!(day2.iter().all(|b| b.is_empty()));
}

#[tokio::test]
async fn test_reingest_with_warm_cache_fetches_nothing() {
    let mock_server = mock_exchange().await;
    Mock::given(method("GET"))
        .and(query_param("command", "returnTradeHistory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let ingestor = ingestor(client.clone());
    let temp_dir = TempDir::new().unwrap();
    let bundle = Bundle::new(vec![eth()]).with_range(Some(t0()), Some(t0() + Duration::days(3)));
    let mut cache = MemoryCache::new();

    for _ in 0..2 {
        let mut asset_writer = ParquetAssetWriter::new(temp_dir.path().to_path_buf());
        let mut bar_writer = ParquetBarWriter::new(temp_dir.path().to_path_buf());
        let ctx = IngestContext {
            asset_writer: &mut asset_writer,
            bar_writer: &mut bar_writer,
            cache: &mut cache,
            sessions: t0()..t0() + Duration::days(3),
            show_progress: true,
        };
        bundle.ingest(client.as_ref(), &ingestor, ctx).await.unwrap();
    }

    // One fetch per asset-day across both runs
    assert_eq!(cache.len(), 3);
}

#[tokio::test]
async fn test_unlisted_asset_fails_before_fetching() {
    let mock_server = mock_exchange().await;
    Mock::given(method("GET"))
        .and(query_param("command", "returnTradeHistory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let ingestor = ingestor(client.clone());
    let temp_dir = TempDir::new().unwrap();
    let bundle = Bundle::new(vec!["USDT_XMR".parse().unwrap()]);

    let mut asset_writer = ParquetAssetWriter::new(temp_dir.path().to_path_buf());
    let mut bar_writer = ParquetBarWriter::new(temp_dir.path().to_path_buf());
    let mut cache = MemoryCache::new();
    let ctx = IngestContext {
        asset_writer: &mut asset_writer,
        bar_writer: &mut bar_writer,
        cache: &mut cache,
        sessions: t0()..t0() + Duration::days(1),
        show_progress: false,
    };

    let result = bundle.ingest(client.as_ref(), &ingestor, ctx).await;

    assert!(matches!(result, Err(IngestError::UnknownAsset(s)) if s == "XMR"));
    assert!(!asset_writer.path().exists());
}
