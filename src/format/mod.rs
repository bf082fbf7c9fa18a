//! Format scanning - infer the argument schema of a printf-style format
//!
//! Design: pure, total scan over code units. The same state machine serves
//! narrow (`u8`) and wide (`u16`/`u32`/`wchar_t`) format strings.
//!
//! Architecture:
//! - `scanner.rs` - two-state scan and the `FormatUnit` abstraction
//! - `tests.rs` - unit and property tests

mod scanner;

pub use scanner::{
    scan, scan_nul_terminated, unit_len, ArgClass, Classification, FormatUnit, ScanError,
};

/// Upper bound on classified arguments per call
///
/// The wire message is sized against this limit; a format string implying
/// more conversions is an overflow.
pub const MAX_ARGS: usize = 256;

/// Exit status used when an overflow terminates the process
pub const OVERFLOW_EXIT_STATUS: i32 = 255;
