use std::path::PathBuf;

use anyhow::Context;
use time::UtcOffset;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub key_prefix: String,
    pub seed_demo: bool,
    pub calorie_target: u32,
    pub utc_offset: UtcOffset,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./fittrack-data"),
            key_prefix: "fittrack_".into(),
            seed_demo: true,
            calorie_target: 2000,
            utc_offset: UtcOffset::UTC,
            log: LogConfig {
                filter: "fittrack=debug".into(),
                json: false,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let seed_demo = match get("FITTRACK_SEED_DEMO") {
            Some(v) => parse_bool(&v).with_context(|| format!("FITTRACK_SEED_DEMO={v}"))?,
            None => defaults.seed_demo,
        };
        let calorie_target = match get("FITTRACK_CALORIE_TARGET") {
            Some(v) => {
                let kcal: u32 = v
                    .parse()
                    .with_context(|| format!("FITTRACK_CALORIE_TARGET={v}"))?;
                anyhow::ensure!(kcal > 0, "FITTRACK_CALORIE_TARGET must be positive");
                kcal
            }
            None => defaults.calorie_target,
        };
        let utc_offset = match get("FITTRACK_UTC_OFFSET_MINUTES") {
            Some(v) => {
                let minutes: i32 = v
                    .parse()
                    .with_context(|| format!("FITTRACK_UTC_OFFSET_MINUTES={v}"))?;
                minutes
                    .checked_mul(60)
                    .and_then(|secs| UtcOffset::from_whole_seconds(secs).ok())
                    .with_context(|| format!("FITTRACK_UTC_OFFSET_MINUTES={v} out of range"))?
            }
            None => defaults.utc_offset,
        };

        Ok(Self {
            data_dir: get("FITTRACK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            key_prefix: get("FITTRACK_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            seed_demo,
            calorie_target,
            utc_offset,
            log: LogConfig {
                filter: get("RUST_LOG").unwrap_or(defaults.log.filter),
                json: get("LOG_FORMAT").map(|v| v == "json").unwrap_or(false),
            },
        })
    }
}

fn parse_bool(v: &str) -> anyhow::Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: {other}"),
    }
}
