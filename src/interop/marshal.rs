//! Argument marshaling - caller arguments → call message
//!
//! Design: the classification decides how each slot is fetched; the
//! argument source only hands out raw 64-bit integers or doubles, the way
//! `va_arg` would.

use super::types::{Arg, WireArg};
use crate::format::{ArgClass, Classification};
use crate::protocol::{CallMessage, CallSelector, GuestAddr};
use tracing::{trace, warn};

/// Sequential source of variadic arguments (`va_list` analogue)
pub trait ArgSource {
    /// Fetch the next slot as a 64-bit integer or pointer
    fn next_integer(&mut self) -> u64;

    /// Fetch the next slot as a promoted double
    fn next_double(&mut self) -> f64;
}

impl<S: ArgSource + ?Sized> ArgSource for &mut S {
    #[inline]
    fn next_integer(&mut self) -> u64 {
        (**self).next_integer()
    }

    #[inline]
    fn next_double(&mut self) -> f64 {
        (**self).next_double()
    }
}

/// Owned argument list built on the Rust side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarArgs {
    args: Vec<Arg>,
    cursor: usize,
}

impl VarArgs {
    #[inline]
    pub fn new(args: Vec<Arg>) -> Self {
        Self { args, cursor: 0 }
    }

    #[inline]
    pub fn push(&mut self, arg: impl Into<Arg>) {
        self.args.push(arg.into());
    }

    /// Arguments not yet consumed
    #[inline]
    pub fn remaining(&self) -> usize {
        self.args.len().saturating_sub(self.cursor)
    }

    /// Rewind so the list can be marshaled again
    #[inline]
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    fn next_arg(&mut self) -> Option<Arg> {
        let arg = self.args.get(self.cursor).copied();
        if arg.is_some() {
            self.cursor += 1;
        } else {
            warn!(consumed = self.cursor, "argument list exhausted, substituting zero");
        }
        arg
    }
}

impl ArgSource for VarArgs {
    fn next_integer(&mut self) -> u64 {
        self.next_arg().map_or(0, Arg::to_u64)
    }

    fn next_double(&mut self) -> f64 {
        self.next_arg().map_or(0.0, Arg::to_f64)
    }
}

impl From<Vec<Arg>> for VarArgs {
    fn from(args: Vec<Arg>) -> Self {
        Self::new(args)
    }
}

impl FromIterator<Arg> for VarArgs {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Build a [`VarArgs`] list, applying default argument promotions
#[macro_export]
macro_rules! vargs {
    () => { $crate::interop::VarArgs::default() };
    ($($arg:expr),+ $(,)?) => {
        $crate::interop::VarArgs::new(vec![$($crate::interop::Arg::from($arg)),+])
    };
}

/// Reader over a guest argument block of little-endian 8-byte slots
#[derive(Debug, Clone)]
pub struct SlotReader<'a> {
    block: &'a [u8],
    offset: usize,
}

impl<'a> SlotReader<'a> {
    pub const SLOT_SIZE: usize = 8;

    #[inline]
    pub fn new(block: &'a [u8]) -> Self {
        Self { block, offset: 0 }
    }

    /// Byte offset of the next slot
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn next_slot(&mut self) -> u64 {
        let end = self.offset + Self::SLOT_SIZE;
        match self.block.get(self.offset..end) {
            Some(bytes) => {
                self.offset = end;
                let mut slot = [0u8; Self::SLOT_SIZE];
                slot.copy_from_slice(bytes);
                u64::from_le_bytes(slot)
            }
            None => {
                warn!(
                    offset = self.offset,
                    block_len = self.block.len(),
                    "argument block exhausted, substituting zero"
                );
                0
            }
        }
    }
}

impl ArgSource for SlotReader<'_> {
    #[inline]
    fn next_integer(&mut self) -> u64 {
        self.next_slot()
    }

    #[inline]
    fn next_double(&mut self) -> f64 {
        f64::from_bits(self.next_slot())
    }
}

/// Fetch one argument of the given class
#[inline]
pub fn marshal_arg(class: ArgClass, source: &mut impl ArgSource) -> WireArg {
    match class {
        ArgClass::Floating => WireArg::double(source.next_double()),
        ArgClass::Integer => WireArg::integer(source.next_integer()),
    }
}

/// Pack a call message for one printf-family call
///
/// `destination` and `format` are opaque guest references; they are
/// recorded, never dereferenced.
pub fn marshal(
    selector: CallSelector,
    destination: GuestAddr,
    format: GuestAddr,
    classes: &Classification,
    source: &mut impl ArgSource,
) -> CallMessage {
    let mut args = Vec::with_capacity(classes.len());
    let mut float_count = 0;

    for class in classes.iter() {
        let arg = marshal_arg(class, source);
        if arg.is_floating {
            float_count += 1;
        }
        args.push(arg);
    }

    trace!(
        selector = ?selector,
        total = args.len(),
        floats = float_count,
        "marshaled call"
    );

    CallMessage {
        selector,
        destination,
        format,
        float_count,
        args,
    }
}
