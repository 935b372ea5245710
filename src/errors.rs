use std::io;

use thiserror::Error as ThisError;

#[derive(Debug)]
pub struct Error {
    pub message: String,
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error {
            message: value.to_string()
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error {
            message: value.to_string()
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error {
            message: value.to_string()
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        Error {
            message: value.to_string()
        }
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error {
            message: value.to_string()
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            message: value
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single Overpass API attempt, or a whole chunk, did not produce data.
#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    #[error("too many requests (HTTP 429)")]
    RateLimited,

    #[error("failed to parse Overpass API JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("remark from Overpass API: {0}")]
    Remark(String),

    #[error("querying Overpass API failed after {attempts} tries, last error: {last}")]
    ExhaustedRetries {
        attempts: u32,
        last: Box<QueryError>,
    },
}

impl From<ureq::Error> for QueryError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::StatusCode(429) => QueryError::RateLimited,
            ureq::Error::StatusCode(status) => QueryError::Transport {
                message: format!("HTTP status {}", status),
                status: Some(status),
                body: None,
            },
            other => QueryError::Transport {
                message: other.to_string(),
                status: None,
                body: None,
            },
        }
    }
}
