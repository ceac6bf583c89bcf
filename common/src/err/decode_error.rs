use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::str::Utf8Error;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Error reported by the server in an ERR packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub code: u16,
    /// SQL state, five characters. Empty when the server is not using protocol 41.
    pub state: String,
    pub message: String,
}

impl ServerError {
    pub fn new(code: u16, state: &str, message: &str) -> Self {
        ServerError {
            code,
            state: state.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.state.is_empty() {
            write!(f, "ERROR {}: {}", self.code, self.message)
        } else {
            write!(f, "ERROR {} ({}): {}", self.code, self.state, self.message)
        }
    }
}

#[derive(Debug, Error)]
pub enum ReError {
    #[error("io error: {0}")]
    IoError(#[from] io::Error),

    #[error("utf8 error: {0}")]
    Utf8Error(#[from] Utf8Error),

    #[error("utf8 error: {0}")]
    FromUtf8Error(#[from] FromUtf8Error),

    #[error("parse int error: {0}")]
    ParseIntError(#[from] ParseIntError),

    /// Socket could not be opened, no protocol bytes were exchanged.
    #[error("dial error: {0}")]
    DialError(String),

    /// Malformed or unexpected packet. The connection should not be reused.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Credentials rejected or the auth exchange could not be completed.
    #[error("authentication error: {0}")]
    AuthenticationError(String),

    /// ERR packet returned for a command, the connection stays usable.
    #[error("{0}")]
    MySqlError(ServerError),

    /// An option rejected its value or was applied in the wrong state.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("config file parse error: {0}")]
    ConfigFileParseErr(String),
}

impl From<ServerError> for ReError {
    fn from(error: ServerError) -> Self {
        ReError::MySqlError(error)
    }
}

impl ReError {
    pub fn malformed_packet() -> Self {
        ReError::ProtocolError(String::from("malformed packet"))
    }

    /// `true` when the server answered with an ERR packet.
    pub fn is_query_error(&self) -> bool {
        matches!(self, ReError::MySqlError(_))
    }

    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            ReError::MySqlError(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use crate::err::decode_error::{ReError, ServerError};

    #[test]
    fn test_server_error_display() {
        let err = ReError::from(ServerError::new(1045, "28000", "Access denied"));
        assert!(err.is_query_error());
        assert_eq!(err.to_string(), "ERROR 1045 (28000): Access denied");
        assert_eq!(err.server_error().map(|e| e.code), Some(1045));

        let no_state = ServerError::new(1064, "", "syntax");
        assert_eq!(no_state.to_string(), "ERROR 1064: syntax");
    }

    #[test]
    fn test_io_conversion() {
        let err: ReError = io::Error::new(io::ErrorKind::TimedOut, "read timeout").into();
        assert!(matches!(err, ReError::IoError(_)));
        assert!(!err.is_query_error());
        assert!(err.server_error().is_none());
    }
}
