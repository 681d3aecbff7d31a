use anyhow::{Context, Result};
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use url::Url;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PARQUET_URL: &str =
    "https://pub-7ad254fd2edb413b968a33fff1a674d5.r2.dev/liberal.parquet";
pub const DEFAULT_LOCAL_FILE: &str = "/tmp/liberal.parquet";
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 15;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub parquet_url: Url,
    pub local_file: PathBuf,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Config::from_env`] but with a caller-supplied variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let parquet_url = lookup("PARQUET_URL").unwrap_or_else(|| DEFAULT_PARQUET_URL.to_string());
        let parquet_url =
            Url::parse(&parquet_url).with_context(|| format!("parsing PARQUET_URL {}", parquet_url))?;
        let local_file = lookup("LOCAL_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_FILE));
        let rate_limit_max = parse_or(&lookup, "RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX)?;
        let window_secs = parse_or(
            &lookup,
            "RATE_LIMIT_WINDOW_SECS",
            DEFAULT_RATE_LIMIT_WINDOW_SECS,
        )?;
        if window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }

        Ok(Self {
            port,
            parquet_url,
            local_file,
            rate_limit_max,
            rate_limit_window: Duration::from_secs(window_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("parsing {}={:?}", key, raw)),
        None => Ok(default),
    }
}
