//! C API for foreign callers of the format scanner
//!
//! Design: classification tags are written as bytes (0 integer, 1 floating)
//! into a caller buffer, `snprintf`-style: at most `capacity` tags are
//! written and the full count is returned.

use crate::format::{scan_nul_terminated, Classification, FormatUnit};
use std::os::raw::{c_char, c_int};

/// Install the default log subscriber (idempotent)
#[no_mangle]
pub extern "C" fn vabridge_init_logging() {
    crate::logging::init();
}

/// Classify a narrow format string
///
/// Returns the number of conversions, or -1 for a null format or a format
/// implying more than 256 arguments. `classes_out` may be null when
/// `capacity` is 0.
///
/// # Safety
/// `format` must be NUL-terminated; `classes_out` must be writable for
/// `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn vabridge_scan_format(
    format: *const c_char,
    classes_out: *mut u8,
    capacity: usize,
) -> c_int {
    scan_into(format.cast::<u8>(), classes_out, capacity)
}

/// Classify a wide format string; same contract as `vabridge_scan_format`
///
/// # Safety
/// `format` must be NUL-terminated; `classes_out` must be writable for
/// `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn vabridge_scan_format_wide(
    format: *const libc::wchar_t,
    classes_out: *mut u8,
    capacity: usize,
) -> c_int {
    scan_into(format, classes_out, capacity)
}

unsafe fn scan_into<U: FormatUnit>(format: *const U, out: *mut u8, capacity: usize) -> c_int {
    if format.is_null() {
        return -1;
    }

    let classes = match scan_nul_terminated(format) {
        Ok(classes) => classes,
        Err(_) => return -1,
    };

    if !out.is_null() {
        write_tags(&classes, core::slice::from_raw_parts_mut(out, capacity));
    }
    classes.len() as c_int
}

fn write_tags(classes: &Classification, out: &mut [u8]) {
    for (slot, class) in out.iter_mut().zip(classes.iter()) {
        *slot = class as u8;
    }
}
