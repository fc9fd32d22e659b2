//! Error types for the object RPC client.
use thiserror::Error;

/// Errors returned by [`crate::ObjectStore`] implementations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The endpoint could not be reached or timed out.
    #[error("connection error: {0}")]
    Connection(String),
    /// The endpoint rejected the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// A call was issued before `authenticate` succeeded.
    #[error("not authenticated")]
    NotAuthenticated,
    /// The remote store raised an error while executing the call.
    #[error("remote fault {code}: {message}")]
    Fault { code: i64, message: String },
    /// The response did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl RpcError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn fault(code: i64, msg: impl Into<String>) -> Self {
        Self::Fault {
            code,
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// True for failures that make every further call pointless: the run
    /// using this store must stop.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Authentication(_) | Self::NotAuthenticated
        )
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
