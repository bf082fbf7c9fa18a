//! Default output stream capability
//!
//! Calls that name no stream write to the host process's own standard
//! stream, looked up per call from a `StreamProvider`.

use crate::config::DefaultStream;
use crate::errors::BridgeError;
use core::ffi::c_void;
use core::ptr::NonNull;

/// Source of the stream used when a call names none
pub trait StreamProvider: Send + Sync {
    fn default_stream(&self) -> Result<NonNull<c_void>, BridgeError>;
}

/// The C runtime's `stdout` or `stderr`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdStreams {
    which: DefaultStream,
}

impl StdStreams {
    #[inline]
    pub const fn new(which: DefaultStream) -> Self {
        Self { which }
    }

    #[inline]
    pub fn which(&self) -> DefaultStream {
        self.which
    }
}

impl StreamProvider for StdStreams {
    fn default_stream(&self) -> Result<NonNull<c_void>, BridgeError> {
        let stream = unsafe { std_stream(self.which) };
        NonNull::new(stream).ok_or(BridgeError::StreamUnavailable(
            "C runtime standard stream is null",
        ))
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe fn std_stream(which: DefaultStream) -> *mut c_void {
    extern "C" {
        static mut stdout: *mut libc::FILE;
        static mut stderr: *mut libc::FILE;
    }

    match which {
        DefaultStream::Stdout => core::ptr::addr_of!(stdout).read().cast(),
        DefaultStream::Stderr => core::ptr::addr_of!(stderr).read().cast(),
    }
}

#[cfg(any(target_vendor = "apple", target_os = "freebsd"))]
unsafe fn std_stream(which: DefaultStream) -> *mut c_void {
    extern "C" {
        static mut __stdoutp: *mut libc::FILE;
        static mut __stderrp: *mut libc::FILE;
    }

    match which {
        DefaultStream::Stdout => core::ptr::addr_of!(__stdoutp).read().cast(),
        DefaultStream::Stderr => core::ptr::addr_of!(__stderrp).read().cast(),
    }
}

#[cfg(windows)]
unsafe fn std_stream(which: DefaultStream) -> *mut c_void {
    extern "C" {
        fn __acrt_iob_func(index: u32) -> *mut c_void;
    }

    match which {
        DefaultStream::Stdout => __acrt_iob_func(1),
        DefaultStream::Stderr => __acrt_iob_func(2),
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_vendor = "apple",
    target_os = "freebsd",
    windows
)))]
unsafe fn std_stream(_which: DefaultStream) -> *mut c_void {
    core::ptr::null_mut()
}

/// A fixed host stream, e.g. to capture default-stream output
#[derive(Debug, Clone, Copy)]
pub struct FixedStream {
    stream: NonNull<c_void>,
}

impl FixedStream {
    /// # Safety
    /// `stream` must stay a valid `FILE *` for as long as calls can use it.
    #[inline]
    pub unsafe fn new(stream: NonNull<c_void>) -> Self {
        Self { stream }
    }
}

// A FILE handle carries its own lock in the C runtime.
unsafe impl Send for FixedStream {}
unsafe impl Sync for FixedStream {}

impl StreamProvider for FixedStream {
    #[inline]
    fn default_stream(&self) -> Result<NonNull<c_void>, BridgeError> {
        Ok(self.stream)
    }
}
