use thiserror::Error;

// Failure of a single resource within a tick. Never fatal: the poller
// falls back to the previous value for that resource.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{resource} returned status {status}")]
    Status { resource: &'static str, status: u16 },

    #[error("{resource} response could not be decoded: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{resource} response is malformed: {reason}")]
    Malformed { resource: &'static str, reason: String },
}

// Lifecycle misuse, rejected synchronously at the API boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollerError {
    #[error("poller is already running")]
    AlreadyRunning,

    #[error("poll interval must be greater than zero")]
    InvalidInterval,

    #[error("poller must be started from within a tokio runtime")]
    NoRuntime,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
