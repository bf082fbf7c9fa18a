//! Unified error type for bridge operations

use crate::config::ConfigError;
use crate::format::ScanError;
use crate::interop::CallError;
use crate::protocol::WireError;
use thiserror::Error;

/// Top-level error for a forwarded call
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("format scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("malformed call message: {0}")]
    Wire(#[from] WireError),

    #[error("variadic replay failed: {0}")]
    Call(#[from] CallError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{selector} call has a null format string")]
    NullFormat { selector: &'static str },

    #[error("{selector} call has a null destination")]
    NullDestination { selector: &'static str },

    #[error("default stream unavailable: {0}")]
    StreamUnavailable(&'static str),

    #[error("format string is not NUL-terminated")]
    MissingTerminator,

    #[error("call result {0} does not fit the guest return type")]
    ResultOutOfRange(i64),
}

impl BridgeError {
    /// True when the host did not recognize the call selector
    #[inline]
    pub fn is_unknown_selector(&self) -> bool {
        matches!(self, Self::Wire(WireError::UnknownSelector(_)))
    }
}
