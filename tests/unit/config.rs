use serial_test::serial;
use std::env;
use wallet_fingerprinting::config::{AppConfig, Backend, BitcoinRpcConfig, EsploraConfig};

#[test]
fn test_rpc_config_creation() {
    let config = BitcoinRpcConfig::default();

    assert_eq!(config.url, "http://localhost:8332");
    assert_eq!(config.timeout_seconds, 60);
    assert_eq!(config.max_retries, 10);
    assert_eq!(config.concurrent_requests, 10);
    assert!(config.initial_backoff_ms > 0);
    assert!(config.backoff_multiplier > 1.0);
    assert!(config.max_backoff_seconds > 0);
}

#[test]
fn test_esplora_config_creation() {
    let config = EsploraConfig::default();

    assert_eq!(config.base_url, "https://mempool.space/api");
    assert!(config.concurrent_requests > 0);
    assert!(config.backoff_multiplier > 1.0);
}

#[test]
fn test_backend_display_round_trips() {
    for backend in [Backend::BitcoinCore, Backend::Esplora] {
        assert_eq!(backend.to_string().parse::<Backend>(), Ok(backend));
    }
    assert_eq!("core".parse::<Backend>(), Ok(Backend::BitcoinCore));
    assert_eq!("mempool".parse::<Backend>(), Ok(Backend::Esplora));
}

#[test]
#[serial]
fn test_nested_env_override() {
    env::set_var("FINGERPRINT_ANALYSIS__FIRST_N_TXS", "25");
    env::set_var("FINGERPRINT_ESPLORA__MAX_RETRIES", "2");

    let config = AppConfig::load().unwrap();
    assert_eq!(config.analysis.first_n_txs, 25);
    assert_eq!(config.esplora.max_retries, 2);

    env::remove_var("FINGERPRINT_ANALYSIS__FIRST_N_TXS");
    env::remove_var("FINGERPRINT_ESPLORA__MAX_RETRIES");
}

#[test]
#[serial]
fn test_zero_concurrency_rejected() {
    env::set_var("FINGERPRINT_ANALYSIS__CONCURRENT_TRANSACTIONS", "0");

    let result = AppConfig::load();
    env::remove_var("FINGERPRINT_ANALYSIS__CONCURRENT_TRANSACTIONS");

    assert!(result.is_err());
    let fallback = AppConfig::get_defaults().unwrap();
    assert!(fallback.analysis.concurrent_transactions > 0);
}
