//! Server configuration.
//!
//! Every setting is read from an environment variable. Missing or invalid values are logged and replaced with a
//! default, so the server always starts.
use std::{env, time::Duration};

use log::*;
use loyalty_common::helpers::{parse_boolean_flag, parse_env_var};
use loyalty_engine::AccrualClientConfig;

use crate::accrual_worker::AccrualWorkerConfig;

pub const DEFAULT_LP_HOST: &str = "127.0.0.1";
pub const DEFAULT_LP_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty.db";
pub const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://127.0.0.1:8081";
pub const DEFAULT_ACCRUAL_CONCURRENCY: usize = 4;
pub const DEFAULT_ACCRUAL_IDLE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_ACCRUAL_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, database migrations are run when the server starts.
    pub auto_migrate: bool,
    pub accrual: AccrualConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LP_HOST.to_string(),
            port: DEFAULT_LP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auto_migrate: true,
            accrual: AccrualConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LP_HOST").ok().unwrap_or_else(|| DEFAULT_LP_HOST.into());
        let port = env_or_default("LP_PORT", DEFAULT_LP_PORT);
        let database_url = env::var("LP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ LP_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auto_migrate = parse_boolean_flag(env::var("LP_AUTO_MIGRATE").ok(), true);
        let accrual = AccrualConfig::from_env_or_default();
        Self { host, port, database_url, auto_migrate, accrual }
    }
}

//-------------------------------------------------  AccrualConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct AccrualConfig {
    /// The root address of the accrual service
    pub base_url: String,
    /// The maximum number of accrual queries in flight at once
    pub concurrency: usize,
    /// The pause between reconciliation passes
    pub idle_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string(),
            concurrency: DEFAULT_ACCRUAL_CONCURRENCY,
            idle_interval: Duration::from_millis(DEFAULT_ACCRUAL_IDLE_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_ACCRUAL_TIMEOUT_SECS),
        }
    }
}

impl AccrualConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("LP_ACCRUAL_SYSTEM_ADDRESS").ok().unwrap_or_else(|| {
            warn!("🪛️ LP_ACCRUAL_SYSTEM_ADDRESS is not set. Using {DEFAULT_ACCRUAL_SYSTEM_ADDRESS}");
            DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string()
        });
        let mut concurrency = env_or_default("LP_ACCRUAL_CONCURRENCY", DEFAULT_ACCRUAL_CONCURRENCY);
        if concurrency == 0 {
            warn!("🪛️ LP_ACCRUAL_CONCURRENCY must be at least 1. Using 1.");
            concurrency = 1;
        }
        let idle_ms = env_or_default("LP_ACCRUAL_IDLE_INTERVAL_MS", DEFAULT_ACCRUAL_IDLE_INTERVAL_MS);
        let timeout_secs = env_or_default("LP_ACCRUAL_TIMEOUT_SECS", DEFAULT_ACCRUAL_TIMEOUT_SECS);
        Self {
            base_url,
            concurrency,
            idle_interval: Duration::from_millis(idle_ms),
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn client_config(&self) -> AccrualClientConfig {
        AccrualClientConfig::new(self.base_url.clone()).with_timeout(self.request_timeout)
    }

    pub fn worker_config(&self) -> AccrualWorkerConfig {
        AccrualWorkerConfig { concurrency: self.concurrency, idle_interval: self.idle_interval }
    }
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match parse_env_var::<T>(name) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            error!("🪛️ {e} Using the default, {default}, instead.");
            default
        },
        None => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.auto_migrate);
        assert_eq!(config.accrual.concurrency, 4);
        assert_eq!(config.accrual.idle_interval, Duration::from_secs(1));
        assert_eq!(config.accrual.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        env::set_var("LP_TEST_CONFIG_BAD_PORT", "not-a-port");
        assert_eq!(env_or_default("LP_TEST_CONFIG_BAD_PORT", 1234u16), 1234);
        env::set_var("LP_TEST_CONFIG_GOOD_PORT", " 9000 ");
        assert_eq!(env_or_default("LP_TEST_CONFIG_GOOD_PORT", 1234u16), 9000);
        assert_eq!(env_or_default("LP_TEST_CONFIG_NOT_SET", 25u64), 25);
    }

    #[test]
    fn accrual_sub_configs() {
        let config = AccrualConfig {
            base_url: "http://accrual:8081".into(),
            concurrency: 2,
            idle_interval: Duration::from_millis(250),
            request_timeout: Duration::from_secs(3),
        };
        let client = config.client_config();
        assert_eq!(client.base_url, "http://accrual:8081");
        assert_eq!(client.timeout, Duration::from_secs(3));
        let worker = config.worker_config();
        assert_eq!(worker.concurrency, 2);
        assert_eq!(worker.idle_interval, Duration::from_millis(250));
    }
}
