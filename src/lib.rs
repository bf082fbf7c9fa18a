//! vabridge - forward printf-family variadic calls from a guest to a host
//!
//! A guest-side call is classified from its format string, marshaled into a
//! flat call message, carried over a synchronous transport and replayed on
//! the host as a native variadic call.

pub mod bridge;
pub mod config;
pub mod errors;
pub mod ffi;
pub mod format;
pub mod guest;
pub mod host;
pub mod interop;
pub mod logging;
pub mod protocol;

// Re-export core types
pub use bridge::{AddressSpace, IdentitySpace, LocalBridge, OffsetSpace, SerializedBridge, Transport};
pub use config::{BridgeConfig, ConfigError, DefaultStream, OverflowPolicy};
pub use errors::BridgeError;
pub use format::{scan, ArgClass, Classification, ScanError, MAX_ARGS};
pub use guest::Guest;
pub use host::{Dispatcher, HostStats, StreamProvider};
pub use interop::{marshal, Arg, ArgSource, SlotReader, VarArgs, WireArg};
pub use protocol::{CallMessage, CallSelector, GuestAddr, WireError};

/// Guest and host in one process, sharing the address space
///
/// Also installs the log subscriber described by `config.logging`, unless
/// one is already installed.
pub fn local(config: &BridgeConfig) -> Result<Guest<LocalBridge>, BridgeError> {
    logging::init_with_config(config.logging.to_log_config()?);

    let bridge = LocalBridge::from_config(config, std::sync::Arc::new(IdentitySpace));
    Ok(Guest::from_config(bridge, config))
}
