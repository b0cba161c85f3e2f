use anyhow::Context;
use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub data_dir: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub session_sweep: Duration,
    pub checkout_delay: Duration,
    pub listing_delay: Duration,
    pub tls: Option<(PathBuf, PathBuf)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: None,
            catalog_path: None,
            session_secret: uuid::Uuid::new_v4().to_string(),
            session_ttl: Duration::from_secs(86_400),
            session_sweep: Duration::from_secs(60),
            checkout_delay: Duration::from_millis(2_000),
            listing_delay: Duration::from_millis(1_500),
            tls: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let session_secret = match var("SESSION_SECRET") {
            Some(s) if !s.is_empty() => s,
            _ => {
                warn!("SESSION_SECRET not set; tokens will not survive a restart");
                uuid::Uuid::new_v4().to_string()
            }
        };
        let tls = match (var("TLS_CERT_PATH"), var("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            _ => None,
        };
        Ok(Self {
            addr: try_load("BOOKBAY_ADDR", "0.0.0.0:8080")?,
            data_dir: var("DATA_DIR").map(PathBuf::from),
            catalog_path: var("CATALOG_PATH").map(PathBuf::from),
            session_secret,
            session_ttl: Duration::from_secs(try_load("SESSION_TTL_SECS", "86400")?),
            session_sweep: Duration::from_secs(try_load("SESSION_SWEEP_SECS", "60")?),
            checkout_delay: Duration::from_millis(try_load("CHECKOUT_DELAY_MS", "2000")?),
            listing_delay: Duration::from_millis(try_load("LISTING_DELAY_MS", "1500")?),
            tls,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let addr: SocketAddr = try_load("BOOKBAY_TEST_UNSET_ADDR", "127.0.0.1:9000").unwrap();
        assert_eq!(addr.port(), 9000);
        let bad: anyhow::Result<u64> = try_load("BOOKBAY_TEST_UNSET_NUM", "soon");
        assert!(bad.is_err());
    }
}
