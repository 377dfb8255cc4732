use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Ledger API returned {status}: {body}")]
    Ledger { status: u16, body: String },

    #[error("State file error: {0}")]
    State(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SettleError>;
