//! Guest side - printf-family entry points that forward to the host
//!
//! Each entry point classifies its format string, marshals the arguments
//! into a call message and blocks on the transport until the host returns
//! the routine's result.

use crate::bridge::Transport;
use crate::config::{BridgeConfig, OverflowPolicy};
use crate::errors::BridgeError;
use crate::format::{scan, Classification, FormatUnit, ScanError, OVERFLOW_EXIT_STATUS};
use crate::interop::{marshal, ArgSource, VarArgs};
use crate::logging::{self, log_overflow};
use crate::protocol::CallSelector;
use core::ffi::{c_char, c_int, c_void, CStr};
use tracing::trace;

/// Guest-side forwarder for printf-family calls
///
/// # Safety of the entry points
/// Like their C counterparts, every entry point trusts its arguments: the
/// argument list must match the format's conversions, pointers passed for
/// `%s`/`%p`/`%n` must be valid on the host, and stream or buffer pointers
/// must be valid (and large enough, for `sprintf`).
#[derive(Debug)]
pub struct Guest<T> {
    transport: T,
    overflow: OverflowPolicy,
}

impl<T: Transport> Guest<T> {
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, OverflowPolicy::default())
    }

    pub fn with_policy(transport: T, overflow: OverflowPolicy) -> Self {
        Self {
            transport,
            overflow,
        }
    }

    pub fn from_config(transport: T, config: &BridgeConfig) -> Self {
        Self::with_policy(transport, config.overflow)
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }

    /// `printf` on the host's default stream
    ///
    /// # Safety
    /// See the type-level documentation.
    pub unsafe fn printf(&self, format: &CStr, mut args: VarArgs) -> Result<c_int, BridgeError> {
        self.forward(
            CallSelector::Printf,
            core::ptr::null(),
            format.to_bytes_with_nul(),
            &mut args,
        )
    }

    /// `fprintf`; a null `stream` selects the host's default stream
    ///
    /// # Safety
    /// See the type-level documentation.
    pub unsafe fn fprintf(
        &self,
        stream: *mut c_void,
        format: &CStr,
        mut args: VarArgs,
    ) -> Result<c_int, BridgeError> {
        self.vfprintf(stream, format, &mut args)
    }

    /// # Safety
    /// See the type-level documentation.
    pub unsafe fn vfprintf(
        &self,
        stream: *mut c_void,
        format: &CStr,
        args: &mut impl ArgSource,
    ) -> Result<c_int, BridgeError> {
        self.forward(
            CallSelector::Fprintf,
            stream,
            format.to_bytes_with_nul(),
            args,
        )
    }

    /// Wide `printf`; `format` must contain a NUL terminator
    ///
    /// # Safety
    /// See the type-level documentation.
    pub unsafe fn wprintf(
        &self,
        format: &[libc::wchar_t],
        mut args: VarArgs,
    ) -> Result<c_int, BridgeError> {
        let format = terminated(format)?;
        self.forward(CallSelector::Wprintf, core::ptr::null(), format, &mut args)
    }

    /// # Safety
    /// See the type-level documentation.
    pub unsafe fn fwprintf(
        &self,
        stream: *mut c_void,
        format: &[libc::wchar_t],
        mut args: VarArgs,
    ) -> Result<c_int, BridgeError> {
        self.vfwprintf(stream, format, &mut args)
    }

    /// # Safety
    /// See the type-level documentation.
    pub unsafe fn vfwprintf(
        &self,
        stream: *mut c_void,
        format: &[libc::wchar_t],
        args: &mut impl ArgSource,
    ) -> Result<c_int, BridgeError> {
        let format = terminated(format)?;
        self.forward(CallSelector::Fwprintf, stream, format, args)
    }

    /// `sprintf` into a host buffer
    ///
    /// # Safety
    /// `buffer` must have room for the formatted output and its terminator.
    pub unsafe fn sprintf(
        &self,
        buffer: *mut c_char,
        format: &CStr,
        mut args: VarArgs,
    ) -> Result<c_int, BridgeError> {
        self.vsprintf(buffer, format, &mut args)
    }

    /// # Safety
    /// `buffer` must have room for the formatted output and its terminator.
    pub unsafe fn vsprintf(
        &self,
        buffer: *mut c_char,
        format: &CStr,
        args: &mut impl ArgSource,
    ) -> Result<c_int, BridgeError> {
        self.forward(
            CallSelector::Sprintf,
            buffer.cast::<c_void>(),
            format.to_bytes_with_nul(),
            args,
        )
    }

    fn classify<U: FormatUnit>(&self, format: &[U]) -> Result<Classification, BridgeError> {
        match scan(format) {
            Ok(classes) => Ok(classes),
            Err(ScanError::Overflow { limit }) => match self.overflow {
                OverflowPolicy::Terminate => {
                    log_overflow(limit, true);
                    logging::flush();
                    std::process::exit(OVERFLOW_EXIT_STATUS)
                }
                OverflowPolicy::Reject => {
                    log_overflow(limit, false);
                    Err(ScanError::Overflow { limit }.into())
                }
            },
        }
    }

    fn forward<U: FormatUnit>(
        &self,
        selector: CallSelector,
        destination: *const c_void,
        format: &[U],
        args: &mut impl ArgSource,
    ) -> Result<c_int, BridgeError> {
        let classes = self.classify(format)?;
        let space = self.transport.address_space();
        let message = marshal(
            selector,
            space.h2g(destination),
            space.h2g(format.as_ptr().cast()),
            &classes,
            args,
        );

        let bytes = message.encode();
        trace!(selector = selector.name(), len = bytes.len(), "forwarding call");
        let result = self.transport.invoke(&bytes)?;
        c_int::try_from(result).map_err(|_| BridgeError::ResultOutOfRange(result))
    }
}

/// Prefix of `format` up to and including its NUL
fn terminated(format: &[libc::wchar_t]) -> Result<&[libc::wchar_t], BridgeError> {
    format
        .iter()
        .position(|&u| u == 0)
        .map(|end| &format[..=end])
        .ok_or(BridgeError::MissingTerminator)
}
