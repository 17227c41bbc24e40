use crate::error::ConfigError;
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:9511";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;
const DEFAULT_TICK_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub tick_timeout: Duration,
    pub generate_images: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            tick_timeout: Duration::from_millis(DEFAULT_TICK_TIMEOUT_MS),
            generate_images: false,
        }
    }
}

impl Config {
    // Reads STORY_VIEWER_* variables; call dotenvy::dotenv() first to pick up .env
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("STORY_VIEWER_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        if base_url.is_empty() {
            return Err(ConfigError::Invalid {
                key: "STORY_VIEWER_BASE_URL",
                value: base_url,
            });
        }

        Ok(Self {
            base_url,
            poll_interval: millis(&lookup, "STORY_VIEWER_POLL_INTERVAL_MS", defaults.poll_interval)?,
            request_timeout: millis(&lookup, "STORY_VIEWER_REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
            tick_timeout: millis(&lookup, "STORY_VIEWER_TICK_TIMEOUT_MS", defaults.tick_timeout)?,
            generate_images: flag(&lookup, "STORY_VIEWER_GENERATE_IMAGES", defaults.generate_images)?,
        })
    }
}

fn millis<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

fn flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}
