//! Shared helpers for integration tests

#![allow(dead_code)]

use std::ffi::c_void;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::os::fd::AsRawFd;
use std::ptr::NonNull;
use std::sync::Arc;
use vabridge::host::{FixedStream, StreamProvider};

/// A C `FILE *` writing into a temporary file
pub struct Capture {
    file: File,
    stream: *mut libc::FILE,
}

impl Capture {
    pub fn new() -> Self {
        let file = tempfile::tempfile().unwrap();
        let stream = unsafe {
            let fd = libc::dup(file.as_raw_fd());
            libc::fdopen(fd, b"w+\0".as_ptr().cast())
        };
        assert!(!stream.is_null(), "fdopen failed");
        Self { file, stream }
    }

    pub fn stream(&self) -> *mut c_void {
        self.stream.cast()
    }

    /// Provider that hands out this stream as the default stream
    pub fn provider(&self) -> Arc<dyn StreamProvider> {
        let stream = NonNull::new(self.stream()).unwrap();
        Arc::new(unsafe { FixedStream::new(stream) })
    }

    pub fn contents(&mut self) -> String {
        unsafe { libc::fflush(self.stream) };
        self.file.seek(SeekFrom::Start(0)).unwrap();
        let mut out = String::new();
        self.file.read_to_string(&mut out).unwrap();
        out
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        unsafe { libc::fclose(self.stream) };
    }
}

/// NUL-terminated wide string
pub fn wide(text: &str) -> Vec<libc::wchar_t> {
    text.chars()
        .map(|c| c as libc::wchar_t)
        .chain(std::iter::once(0))
        .collect()
}

/// Read back a NUL-terminated byte buffer
pub fn buffer_text(buf: &[u8]) -> String {
    std::ffi::CStr::from_bytes_until_nul(buf)
        .unwrap()
        .to_string_lossy()
        .into_owned()
}
