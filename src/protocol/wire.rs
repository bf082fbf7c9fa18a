//! Wire framing
//!
//! Layout, every field a little-endian `u64`:
//!
//! ```text
//! header   selector | total_count | float_count | destination | format
//! trailer  total_count x ( is_floating | payload )
//! ```

use super::message::{CallMessage, CallSelector};
use crate::format::MAX_ARGS;
use crate::interop::WireArg;
use thiserror::Error;

const WORD: usize = 8;

/// Header size in bytes
pub const HEADER_LEN: usize = 5 * WORD;

/// Size of one trailer entry in bytes
pub const ENTRY_LEN: usize = 2 * WORD;

/// Framing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown call selector {0:#x}")]
    UnknownSelector(u64),

    #[error("message truncated: {len} bytes, header needs {}", HEADER_LEN)]
    Truncated { len: usize },

    #[error("message length {len} does not match {count} declared arguments")]
    LengthMismatch { len: usize, count: usize },

    #[error("{count} arguments exceed the limit of {}", MAX_ARGS)]
    TooManyArgs { count: u64 },

    #[error("float count {declared} disagrees with {actual} floating entries")]
    FloatCountMismatch { declared: u64, actual: usize },

    #[error("entry {index} has invalid floating flag {flag}")]
    InvalidFlag { index: usize, flag: u64 },
}

struct Words<'a> {
    bytes: &'a [u8],
}

impl Words<'_> {
    fn take(&mut self) -> u64 {
        let (word, rest) = self.bytes.split_at(WORD);
        self.bytes = rest;
        let mut buf = [0u8; WORD];
        buf.copy_from_slice(word);
        u64::from_le_bytes(buf)
    }
}

impl CallMessage {
    /// Encoded size of a message with `count` arguments
    #[inline]
    pub const fn encoded_len(count: usize) -> usize {
        HEADER_LEN + count * ENTRY_LEN
    }

    /// Serialize into an exactly-sized buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::encoded_len(self.args.len()));
        let header = [
            self.selector.id(),
            self.args.len() as u64,
            self.float_count as u64,
            self.destination,
            self.format,
        ];
        for word in header {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for arg in &self.args {
            out.extend_from_slice(&u64::from(arg.is_floating).to_le_bytes());
            out.extend_from_slice(&arg.payload.to_le_bytes());
        }
        out
    }

    /// Parse and validate a message
    ///
    /// The buffer must hold exactly the declared number of entries.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < HEADER_LEN {
            return Err(WireError::Truncated { len: bytes.len() });
        }

        let mut words = Words { bytes };
        let selector = words.take();
        let count = words.take();
        let declared_floats = words.take();
        let destination = words.take();
        let format = words.take();

        let selector = CallSelector::try_from(selector)?;
        if count > MAX_ARGS as u64 {
            return Err(WireError::TooManyArgs { count });
        }
        let count = count as usize;
        if bytes.len() != Self::encoded_len(count) {
            return Err(WireError::LengthMismatch {
                len: bytes.len(),
                count,
            });
        }

        let mut args = Vec::with_capacity(count);
        for index in 0..count {
            let flag = words.take();
            let payload = words.take();
            let is_floating = match flag {
                0 => false,
                1 => true,
                flag => return Err(WireError::InvalidFlag { index, flag }),
            };
            args.push(WireArg {
                is_floating,
                payload,
            });
        }

        let float_count = args.iter().filter(|a| a.is_floating).count();
        if declared_floats != float_count as u64 {
            return Err(WireError::FloatCountMismatch {
                declared: declared_floats,
                actual: float_count,
            });
        }

        Ok(Self {
            selector,
            destination,
            format,
            float_count,
            args,
        })
    }
}
