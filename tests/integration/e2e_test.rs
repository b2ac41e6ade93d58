//! End-to-end integration tests

use poloniex_bundle::api::Pair;
use poloniex_bundle::cli::registry;
use poloniex_bundle::config::Config;
use poloniex_bundle::ingest::TEST_BUNDLE;
use poloniex_bundle::telemetry::LogFormat;

#[test]
fn test_config_example_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();

    assert_eq!(config.api.base_url, "https://poloniex.com/public");
    assert_eq!(config.rate_limit.max_calls, 6);
    assert_eq!(config.ingest.pairs.len(), Pair::KNOWN.len());
    assert_eq!(config.ingest.bar_width_secs, 60);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
}

#[test]
fn test_example_config_builds_client_and_registry() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();

    let client = poloniex_bundle::api::PoloniexClient::with_config(config.client_config());
    assert!(client.is_ok());

    let registry = registry(&config).unwrap();
    assert!(registry.bundle(&config.ingest.bundle).is_ok());
    assert!(registry.bundle(TEST_BUNDLE).is_ok());
}
