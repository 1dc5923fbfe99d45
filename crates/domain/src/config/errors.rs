use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read configuration file: {0}")]
    Io(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}
