//! # Error Types for the layout engine

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Z64Error {
    // Decode errors
    #[error("Truncated {type_name} at {offset:#x}: need {needed} bytes, {available} available")]
    Truncated {
        type_name: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    // Range errors
    #[error("Value {value} out of range for {type_name}")]
    OutOfRange { type_name: &'static str, value: i128 },

    // Layout errors
    #[error("Bitfield {type_name} declares {declared} bits over a {width}-bit word")]
    BitfieldWidth {
        type_name: &'static str,
        declared: u32,
        width: u32,
    },

    #[error("Index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("{type_name} is dynamically sized and needs an explicit length")]
    MissingLength { type_name: &'static str },

    #[error("{type_name} has no member named `{member}`")]
    UnknownMember {
        type_name: &'static str,
        member: String,
    },

    #[error("Invalid {type_name} size: expected {expected}, found {found} bytes")]
    InvalidEntrySize {
        type_name: &'static str,
        expected: &'static str,
        found: usize,
    },
}

impl Z64Error {
    /// Errors raised by the byte-level engine on corrupt input or misuse.
    ///
    /// These must reach the caller; nothing in the workspace recovers from them.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Z64Error::Truncated { .. }
                | Z64Error::OutOfRange { .. }
                | Z64Error::InvalidEntrySize { .. }
        )
    }

    pub(crate) fn truncated(type_name: &'static str, offset: usize, needed: usize, available: usize) -> Self {
        Z64Error::Truncated {
            type_name,
            offset,
            needed,
            available: available.saturating_sub(offset),
        }
    }
}

pub type Result<T> = std::result::Result<T, Z64Error>;
