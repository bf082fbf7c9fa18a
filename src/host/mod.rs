//! Host side - decode call messages and replay them natively
//!
//! Architecture:
//! - `mod.rs` - `Dispatcher`: selector routing, pointer resolution, stats
//! - `stream.rs` - default stream capability
//! - `targets.rs` - C runtime routines behind each selector

mod stream;
mod targets;

pub use stream::{FixedStream, StdStreams, StreamProvider};
pub use targets::target_for;

use crate::bridge::AddressSpace;
use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::format::unit_len;
use crate::interop::call_va;
use crate::logging::{log_dispatch_error, log_unknown_selector};
use crate::protocol::{CallMessage, CallSelector, WireError};
use core::ffi::{c_char, c_void, CStr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, debug_span, Level};

/// Host statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub calls_made: u64,
    pub float_args: u64,
    pub unknown_selectors: u64,
    pub failed_calls: u64,
}

#[derive(Debug, Default)]
struct Counters {
    calls_made: AtomicU64,
    float_args: AtomicU64,
    unknown_selectors: AtomicU64,
    failed_calls: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> HostStats {
        HostStats {
            calls_made: self.calls_made.load(Ordering::Relaxed),
            float_args: self.float_args.load(Ordering::Relaxed),
            unknown_selectors: self.unknown_selectors.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
        }
    }
}

/// Host-side invoker for printf-family call messages
///
/// Holds no per-call state; concurrent dispatches only share the counters.
pub struct Dispatcher {
    space: Arc<dyn AddressSpace>,
    streams: Arc<dyn StreamProvider>,
    counters: Counters,
}

impl Dispatcher {
    pub fn new(space: Arc<dyn AddressSpace>, streams: Arc<dyn StreamProvider>) -> Self {
        Self {
            space,
            streams,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &BridgeConfig, space: Arc<dyn AddressSpace>) -> Self {
        Self::new(space, Arc::new(StdStreams::new(config.default_stream)))
    }

    #[inline]
    pub fn address_space(&self) -> &dyn AddressSpace {
        &*self.space
    }

    pub fn stats(&self) -> HostStats {
        self.counters.snapshot()
    }

    /// Decode and run one encoded call, returning the target's result
    pub fn dispatch(&self, bytes: &[u8]) -> Result<i64, BridgeError> {
        let message = match CallMessage::decode(bytes) {
            Ok(message) => message,
            Err(WireError::UnknownSelector(id)) => {
                log_unknown_selector(id);
                self.counters.unknown_selectors.fetch_add(1, Ordering::Relaxed);
                return Err(WireError::UnknownSelector(id).into());
            }
            Err(err) => {
                log_dispatch_error("<undecodable>", &err);
                self.counters.failed_calls.fetch_add(1, Ordering::Relaxed);
                return Err(err.into());
            }
        };

        self.invoke(&message)
    }

    /// Run a decoded call
    ///
    /// The target's return value is passed through unmodified, negative
    /// results included.
    pub fn invoke(&self, message: &CallMessage) -> Result<i64, BridgeError> {
        let selector = message.selector;
        let span = debug_span!("dispatch", selector = selector.name());
        let _enter = span.enter();

        let result = self.replay(message);
        match &result {
            Ok(_) => {
                self.counters.calls_made.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .float_args
                    .fetch_add(message.float_count as u64, Ordering::Relaxed);
            }
            Err(err) => {
                log_dispatch_error(selector.name(), err);
                self.counters.failed_calls.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    fn replay(&self, message: &CallMessage) -> Result<i64, BridgeError> {
        let selector = message.selector;
        let destination = self.resolve_destination(message)?;
        let format = self.space.g2h(message.format);
        if format.is_null() {
            return Err(BridgeError::NullFormat {
                selector: selector.name(),
            });
        }

        if tracing::enabled!(Level::DEBUG) {
            let preview = unsafe { format_preview(selector, format) };
            debug!(
                floats = message.float_count,
                args = message.arg_count(),
                format = %preview,
                "replaying call"
            );
        }

        let result = unsafe {
            call_va(
                target_for(selector),
                destination,
                format,
                &message.args,
                message.float_count,
            )?
        };

        Ok(i64::from(result))
    }

    fn resolve_destination(&self, message: &CallMessage) -> Result<*mut c_void, BridgeError> {
        let selector = message.selector;

        if selector.uses_default_stream() || (!selector.writes_buffer() && message.destination == 0) {
            return Ok(self.streams.default_stream()?.as_ptr());
        }

        let destination = self.space.g2h(message.destination);
        if destination.is_null() {
            return Err(BridgeError::NullDestination {
                selector: selector.name(),
            });
        }
        Ok(destination)
    }
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Lossy rendering of a host format string for logs
///
/// # Safety
/// `format` must be a valid NUL-terminated string of the selector's width.
unsafe fn format_preview(selector: CallSelector, format: *const c_void) -> String {
    if selector.is_wide() {
        let units = format.cast::<libc::wchar_t>();
        let units = core::slice::from_raw_parts(units, unit_len(units));
        units
            .iter()
            .map(|&u| char::from_u32(u as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    } else {
        CStr::from_ptr(format.cast::<c_char>())
            .to_string_lossy()
            .into_owned()
    }
}

#[cfg(all(test, unix))]
mod tests;
