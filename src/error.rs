use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubwatchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] ureq::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Delegate request failed: {0}")]
    DelegateError(String),
}

impl SubwatchError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            SubwatchError::HttpError(_) => Some(
                "Check your internet connection and the delegate endpoint in the config",
            ),
            SubwatchError::DelegateError(_) => Some(
                "Check the delegate settings in the config file, or run with --no-delegate",
            ),
            SubwatchError::ConfigError(_) => Some(
                "Edit the config file, or delete it to regenerate defaults",
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SubwatchError>;
