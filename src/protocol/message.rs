//! Call message structure

use super::wire::WireError;
use crate::interop::WireArg;

/// Guest address as carried on the wire
///
/// Only meaningful after translation by the bridge's address space.
pub type GuestAddr = u64;

/// Target routine family of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum CallSelector {
    /// Formatted write to the default stream
    Printf = 0,
    /// Formatted write to an explicit stream
    Fprintf = 1,
    /// Wide formatted write to the default stream
    Wprintf = 2,
    /// Wide formatted write to an explicit stream
    Fwprintf = 3,
    /// Formatted write into a caller buffer
    Sprintf = 4,
}

impl CallSelector {
    pub const ALL: [Self; 5] = [
        Self::Printf,
        Self::Fprintf,
        Self::Wprintf,
        Self::Fwprintf,
        Self::Sprintf,
    ];

    /// Stable wire identifier
    #[inline]
    pub const fn id(self) -> u64 {
        self as u64
    }

    /// Format string made of wide units
    #[inline]
    pub const fn is_wide(self) -> bool {
        matches!(self, Self::Wprintf | Self::Fwprintf)
    }

    /// Always writes to the default stream, whatever the destination field
    #[inline]
    pub const fn uses_default_stream(self) -> bool {
        matches!(self, Self::Printf | Self::Wprintf)
    }

    /// Destination is a character buffer rather than a stream
    #[inline]
    pub const fn writes_buffer(self) -> bool {
        matches!(self, Self::Sprintf)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Printf => "printf",
            Self::Fprintf => "fprintf",
            Self::Wprintf => "wprintf",
            Self::Fwprintf => "fwprintf",
            Self::Sprintf => "sprintf",
        }
    }
}

impl TryFrom<u64> for CallSelector {
    type Error = WireError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|s| s.id() == id)
            .ok_or(WireError::UnknownSelector(id))
    }
}

/// Self-describing payload of one forwarded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMessage {
    pub selector: CallSelector,
    /// Stream or buffer reference, `0` meaning the default stream
    pub destination: GuestAddr,
    pub format: GuestAddr,
    pub float_count: usize,
    pub args: Vec<WireArg>,
}

impl CallMessage {
    /// Total argument count
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Integer/pointer argument count
    #[inline]
    pub fn integer_count(&self) -> usize {
        self.args.len().saturating_sub(self.float_count)
    }
}
