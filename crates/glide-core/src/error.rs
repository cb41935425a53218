use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Scroll container not found: {0}")]
    ContainerNotFound(String),

    #[error("{0} has been destroyed")]
    Destroyed(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
