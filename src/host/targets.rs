//! Host C runtime entry points for each selector

use crate::interop::VariadicTarget;
use crate::protocol::CallSelector;
use core::ffi::{c_int, c_void};

// Declared with untyped pointers so every routine shares `VariadicTarget`.
#[cfg_attr(
    all(windows, target_env = "msvc"),
    link(name = "legacy_stdio_definitions")
)]
extern "C" {
    #[link_name = "fprintf"]
    fn host_fprintf(stream: *mut c_void, format: *const c_void, ...) -> c_int;

    #[link_name = "fwprintf"]
    fn host_fwprintf(stream: *mut c_void, format: *const c_void, ...) -> c_int;

    #[link_name = "sprintf"]
    fn host_sprintf(buffer: *mut c_void, format: *const c_void, ...) -> c_int;
}

/// Native routine serving `selector`
///
/// Default-stream selectors route to the stream variant; the dispatcher
/// supplies the stream.
pub fn target_for(selector: CallSelector) -> VariadicTarget {
    match selector {
        CallSelector::Printf | CallSelector::Fprintf => host_fprintf,
        CallSelector::Wprintf | CallSelector::Fwprintf => host_fwprintf,
        CallSelector::Sprintf => host_sprintf,
    }
}
