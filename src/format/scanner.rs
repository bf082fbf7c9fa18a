//! Two-state printf format scanner
//!
//! Only the conversion characters matter here: literal text, flags, widths
//! and length modifiers are skipped without being evaluated.

use super::MAX_ARGS;
use smallvec::SmallVec;
use thiserror::Error;

/// Register class of one implied argument slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ArgClass {
    /// Integer or pointer, fetched as a 64-bit slot
    Integer = 0,
    /// Floating point, fetched as a promoted double
    Floating = 1,
}

impl ArgClass {
    /// Classify a conversion character, `None` for non-terminals
    #[inline]
    pub const fn of_conversion(c: u8) -> Option<Self> {
        match c {
            b'A' | b'a' | b'E' | b'e' | b'F' | b'f' | b'G' | b'g' => Some(Self::Floating),
            b'c' | b'd' | b'i' | b'n' | b'o' | b'p' | b's' | b'u' | b'X' | b'x' => {
                Some(Self::Integer)
            }
            _ => None,
        }
    }

    #[inline]
    pub const fn is_floating(self) -> bool {
        matches!(self, Self::Floating)
    }
}

/// Ordered argument schema of one format string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    slots: SmallVec<[ArgClass; 16]>,
}

impl Classification {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of floating slots
    pub fn floating_count(&self) -> usize {
        self.slots.iter().filter(|c| c.is_floating()).count()
    }

    #[inline]
    pub fn as_slice(&self) -> &[ArgClass] {
        &self.slots
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = ArgClass> + '_ {
        self.slots.iter().copied()
    }

    fn push(&mut self, class: ArgClass) -> Result<(), ScanError> {
        if self.slots.len() == MAX_ARGS {
            return Err(ScanError::Overflow { limit: MAX_ARGS });
        }
        self.slots.push(class);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Classification {
    type Item = &'a ArgClass;
    type IntoIter = core::slice::Iter<'a, ArgClass>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

/// Scanner errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    #[error("format string implies more than {limit} arguments")]
    Overflow { limit: usize },
}

/// A code unit of a format string
///
/// Conversion characters are all ASCII, so a unit only has to say whether
/// it is the terminator and which ASCII byte (if any) it encodes.
pub trait FormatUnit: Copy + Eq {
    const NUL: Self;

    /// ASCII value of the unit, `None` outside the ASCII range
    fn ascii(self) -> Option<u8>;
}

impl FormatUnit for u8 {
    const NUL: Self = 0;

    #[inline]
    fn ascii(self) -> Option<u8> {
        self.is_ascii().then_some(self)
    }
}

impl FormatUnit for u16 {
    const NUL: Self = 0;

    #[inline]
    fn ascii(self) -> Option<u8> {
        u8::try_from(self).ok().filter(u8::is_ascii)
    }
}

impl FormatUnit for u32 {
    const NUL: Self = 0;

    #[inline]
    fn ascii(self) -> Option<u8> {
        u8::try_from(self).ok().filter(u8::is_ascii)
    }
}

// wchar_t is signed on x86-64 Linux
impl FormatUnit for i32 {
    const NUL: Self = 0;

    #[inline]
    fn ascii(self) -> Option<u8> {
        u8::try_from(self).ok().filter(u8::is_ascii)
    }
}

/// Classify every conversion of `format`
///
/// Scanning stops at the first NUL unit or at the end of the slice. `%%`
/// escapes and a directive left open at the end produce no entry.
pub fn scan<U: FormatUnit>(format: &[U]) -> Result<Classification, ScanError> {
    let mut classes = Classification::new();
    let mut in_directive = false;
    let mut units = format.iter().copied().take_while(|&u| u != U::NUL);

    while let Some(unit) = units.next() {
        let unit = if in_directive {
            unit
        } else {
            if unit.ascii() != Some(b'%') {
                continue;
            }
            match units.next() {
                Some(next) => next,
                None => break,
            }
        };

        let Some(c) = unit.ascii() else {
            in_directive = true;
            continue;
        };
        if c == b'%' {
            continue;
        }

        match ArgClass::of_conversion(c) {
            Some(class) => {
                classes.push(class)?;
                in_directive = false;
            }
            None => in_directive = true,
        }
    }

    Ok(classes)
}

/// Count the units before the NUL terminator
///
/// # Safety
/// `ptr` must point to a readable, NUL-terminated sequence of `U`.
pub unsafe fn unit_len<U: FormatUnit>(ptr: *const U) -> usize {
    let mut len = 0;
    while *ptr.add(len) != U::NUL {
        len += 1;
    }
    len
}

/// Scan a NUL-terminated format string in place
///
/// # Safety
/// Same contract as [`unit_len`].
pub unsafe fn scan_nul_terminated<U: FormatUnit>(
    ptr: *const U,
) -> Result<Classification, ScanError> {
    let units = core::slice::from_raw_parts(ptr, unit_len(ptr));
    scan(units)
}
