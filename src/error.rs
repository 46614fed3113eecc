use std::net::SocketAddr;

use thiserror::Error;

use crate::dns::header::ResultCode;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("compression pointer loop at offset {0}")]
    CompressionLoop(usize),

    #[error("unexpected response from {server}: {reason}")]
    UnexpectedResponse { server: SocketAddr, reason: String },

    #[error("timed out waiting for {0}")]
    Timeout(SocketAddr),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("server failure: {0:?}")]
    ServerFailure(ResultCode),

    #[error("name not found (NXDOMAIN): {0}")]
    NameNotFound(String),

    #[error("maximum referral depth exceeded ({0})")]
    MaxReferralDepthExceeded(usize),

    #[error("no progress resolving {0}")]
    NoProgress(String),
}

impl ResolveError {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        ResolveError::MalformedMessage(msg.into())
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResolveError::Timeout(_))
    }
}
