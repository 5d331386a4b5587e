use std::env;
use std::time::Duration;

use crate::constants::MAX_CORRELATION_PERIOD;
use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Postgresql connection URI postgresql://[userspec@][hostspec][/dbname][?paramspec]
    pub connection_uri: String,
}

impl PostgresConfig {
    pub fn new(uri: &str) -> Self {
        Self {
            connection_uri: uri.to_owned(),
        }
    }
}

/// Runtime settings, read from `EWT_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub postgres: PostgresConfig,
    /// Port of the status server
    pub monitor_port: u16,
    /// Time between two weekly roll-up checks
    pub rollup_interval: Duration,
    /// Time between two correlation scans
    pub correlation_interval: Duration,
    /// Trailing periods, in days, to compute correlations for
    pub correlation_periods: Vec<i32>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let pg_uri = env::var("EWT_POSTGRES_URI")
            .map_err(|_| Error::Config("EWT_POSTGRES_URI is not set".to_owned()))?;
        tracing::debug!("found EWT_POSTGRES_URI environment variable");

        Ok(Self {
            postgres: PostgresConfig::new(&pg_uri),
            monitor_port: parse_var("EWT_MONITOR_PORT", 3005)?,
            rollup_interval: Duration::from_secs(parse_var("EWT_ROLLUP_INTERVAL_SECS", 3600)?),
            correlation_interval: Duration::from_secs(parse_var(
                "EWT_CORRELATION_INTERVAL_SECS",
                21600,
            )?),
            correlation_periods: match env::var("EWT_CORRELATION_PERIODS") {
                Ok(s) => parse_periods(&s)?,
                Err(_) => vec![30, 90],
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(s) => s
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("could not parse {name}: `{s}`"))),
        Err(_) => Ok(default),
    }
}

/// Parses a comma separated list of periods in days, e.g. `30,90`.
pub fn parse_periods(s: &str) -> Result<Vec<i32>> {
    let mut periods = vec![];
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let days: i32 = part
            .trim_end_matches('d')
            .parse()
            .map_err(|_| Error::Config(format!("invalid correlation period `{part}`")))?;
        if days <= 0 || days > MAX_CORRELATION_PERIOD {
            return Err(Error::Config(format!(
                "invalid correlation period `{part}`, expected 1 to {MAX_CORRELATION_PERIOD} days"
            )));
        }
        periods.push(days);
    }
    if periods.is_empty() {
        return Err(Error::Config("no correlation periods".to_owned()));
    }
    Ok(periods)
}
