//! Type definitions for cross-ABI argument transport
//!
//! Every argument crosses the boundary as one tagged 64-bit slot, wide
//! enough for a pointer, an integer or a double on either side.

use crate::format::ArgClass;

/// One argument as carried in a call message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireArg {
    pub is_floating: bool,
    pub payload: u64,
}

impl WireArg {
    /// Integer or pointer slot
    #[inline]
    pub const fn integer(payload: u64) -> Self {
        Self {
            is_floating: false,
            payload,
        }
    }

    /// Floating slot holding the bit pattern of `value`
    #[inline]
    pub fn double(value: f64) -> Self {
        Self {
            is_floating: true,
            payload: value.to_bits(),
        }
    }

    #[inline]
    pub const fn class(self) -> ArgClass {
        if self.is_floating {
            ArgClass::Floating
        } else {
            ArgClass::Integer
        }
    }

    /// Reinterpret the payload as a double
    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from_bits(self.payload)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.payload
    }

    #[inline]
    pub const fn as_i64(self) -> i64 {
        self.payload as i64
    }
}

/// A caller-supplied variadic argument before promotion
///
/// Conversions follow C default argument promotions: `f32` widens to
/// `f64`, narrower integers widen to a full 64-bit slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg {
    Int(i64),
    Uint(u64),
    Double(f64),
    Ptr(usize),
}

impl Arg {
    /// 64-bit integer view, as `va_arg(ap, uint64_t)` would see it
    #[inline]
    pub fn to_u64(self) -> u64 {
        match self {
            Self::Int(v) => v as u64,
            Self::Uint(v) => v,
            Self::Double(v) => v.to_bits(),
            Self::Ptr(p) => p as u64,
        }
    }

    /// Double view, as `va_arg(ap, double)` would see it
    #[inline]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Double(v) => v,
            other => f64::from_bits(other.to_u64()),
        }
    }
}

macro_rules! arg_from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Arg {
            #[inline]
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

macro_rules! arg_from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Arg {
            #[inline]
            fn from(v: $t) -> Self {
                Self::Uint(u64::from(v))
            }
        }
    )*};
}

arg_from_signed!(i8, i16, i32, i64);
arg_from_unsigned!(u8, u16, u32, u64, bool);

impl From<isize> for Arg {
    #[inline]
    fn from(v: isize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for Arg {
    #[inline]
    fn from(v: usize) -> Self {
        Self::Uint(v as u64)
    }
}

impl From<char> for Arg {
    #[inline]
    fn from(v: char) -> Self {
        Self::Uint(u64::from(u32::from(v)))
    }
}

impl From<f32> for Arg {
    #[inline]
    fn from(v: f32) -> Self {
        Self::Double(f64::from(v))
    }
}

impl From<f64> for Arg {
    #[inline]
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl<T> From<*const T> for Arg {
    #[inline]
    fn from(p: *const T) -> Self {
        Self::Ptr(p as usize)
    }
}

impl<T> From<*mut T> for Arg {
    #[inline]
    fn from(p: *mut T) -> Self {
        Self::Ptr(p as usize)
    }
}

impl From<&core::ffi::CStr> for Arg {
    #[inline]
    fn from(s: &core::ffi::CStr) -> Self {
        Self::Ptr(s.as_ptr() as usize)
    }
}
