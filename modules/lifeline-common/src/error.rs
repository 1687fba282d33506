use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifelineError {
    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
