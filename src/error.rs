//! Error types for jukefs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JukeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Tag extraction error: {0}")]
    Tag(#[from] lofty::error::LoftyError),

    #[error("Mount error: {0}")]
    Mount(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, JukeError>;
