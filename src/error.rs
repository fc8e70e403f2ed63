//! Error types and handling for `WeatherHub`

use thiserror::Error;

/// Main error type for the `WeatherHub` service
///
/// Only [`WeatherHubError::EmptyInput`] and [`WeatherHubError::Validation`] are expected
/// to reach an end user. Provider and storage failures are recovered where they happen
/// and only show up here when a caller asks a component directly.
#[derive(Error, Debug)]
pub enum WeatherHubError {
    /// Blank location query
    #[error("Location input cannot be empty")]
    EmptyInput,

    /// Input validation errors (coordinate ranges, malformed input)
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream provider errors (timeouts, non-2xx, malformed payloads)
    #[error("API error: {message}")]
    Api { message: String },

    /// Record storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherHubError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Whether the error is caused by the user's input and can be fixed by retyping it
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::Validation { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherHubError::EmptyInput => "Please enter a location.".to_string(),
            WeatherHubError::Validation { message } => format!("Invalid input: {message}"),
            WeatherHubError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            WeatherHubError::Api { .. } => {
                "Unable to reach external services. Showing the best data available.".to_string()
            }
            WeatherHubError::Storage { .. } => {
                "Saving data failed. Your records are kept for this session only.".to_string()
            }
            WeatherHubError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for WeatherHubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::api(format!("request timed out: {err}"))
        } else {
            Self::api(err.to_string())
        }
    }
}

impl From<fjall::Error> for WeatherHubError {
    fn from(err: fjall::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<postcard::Error> for WeatherHubError {
    fn from(err: postcard::Error) -> Self {
        Self::storage(format!("record encoding failed: {err}"))
    }
}
