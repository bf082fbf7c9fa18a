//! Call protocol - selectors, call messages and their wire framing
//!
//! Architecture:
//! - `message.rs` - `CallSelector` and `CallMessage`
//! - `wire.rs` - little-endian byte layout, encode/decode
//! - `tests.rs` - framing tests

mod message;
mod wire;

pub use message::{CallMessage, CallSelector, GuestAddr};
pub use wire::{WireError, ENTRY_LEN, HEADER_LEN};
