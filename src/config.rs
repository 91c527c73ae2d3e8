use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub lookups: LookupConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub rust_log: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub tournaments_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LookupConfig {
    pub beatleader_url: String,
    pub beatsaver_url: String,
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Zone the create/edit form times are written in.
    pub timezone: Tz,
    pub session_timeout: Duration,
    pub sweep_interval: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Chicago,
            session_timeout: Duration::from_secs(900),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = var_or("PORT", "8080")
            .parse()
            .context("PORT must be a valid port number")?;
        let rust_log =
            env::var("RUST_LOG").unwrap_or_else(|_| "tournament_registry=info".to_string());

        let tournaments_file = PathBuf::from(var_or("TOURNAMENTS_FILE", "tournaments.json"));

        let beatleader_url = var_or("BEATLEADER_URL", "https://api.beatleader.xyz/");
        let beatsaver_url = var_or("BEATSAVER_URL", "https://api.beatsaver.com/");

        let timezone_name = var_or("TOURNAMENT_TIMEZONE", "America/Chicago");
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid TOURNAMENT_TIMEZONE {timezone_name:?}: {e}"))?;
        let session_timeout =
            positive_secs("SESSION_TIMEOUT_SECS", &var_or("SESSION_TIMEOUT_SECS", "900"))?;
        let sweep_interval = positive_secs(
            "SESSION_SWEEP_INTERVAL_SECS",
            &var_or("SESSION_SWEEP_INTERVAL_SECS", "60"),
        )?;

        Ok(Config {
            server: ServerConfig {
                port,
                host,
                rust_log,
            },
            storage: StorageConfig { tournaments_file },
            lookups: LookupConfig {
                beatleader_url,
                beatsaver_url,
            },
            workflow: WorkflowConfig {
                timezone,
                session_timeout,
                sweep_interval,
            },
        })
    }
}

/// Whole seconds, greater than zero.
fn positive_secs(key: &str, raw: &str) -> Result<Duration, anyhow::Error> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    if secs == 0 {
        anyhow::bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
