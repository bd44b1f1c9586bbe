//! Linker error types

use thiserror::Error;
use z64_types::Z64Error;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Layout error: {0}")]
    Layout(#[from] Z64Error),

    #[error("Invalid link configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Block {symbol} at {addr:#x} (+{size:#x}) overlaps {existing} at {existing_addr:#x} (+{existing_size:#x})")]
    Overlap {
        symbol: String,
        addr: u64,
        size: u64,
        existing: String,
        existing_addr: u64,
        existing_size: u64,
    },

    #[error("Unresolved pointer to {target} in {symbol} at offset {offset:#x}")]
    Unresolved {
        symbol: String,
        offset: usize,
        target: String,
    },

    #[error("Symbol {0} placed twice")]
    DuplicateSymbol(String),

    #[error("Symbol {0} has no address")]
    Unplaced(String),

    #[error("Block {symbol} is {actual} bytes but {reserved} were reserved")]
    SizeMismatch {
        symbol: String,
        reserved: u64,
        actual: u64,
    },

    #[error("Address space exhausted placing {symbol} ({size} bytes)")]
    AddressSpace { symbol: String, size: u64 },
}

impl LinkError {
    /// Allocator misuse rather than bad input data.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, LinkError::Layout(_))
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_display() {
        let err = LinkError::Overlap {
            symbol: "B".into(),
            addr: 0x10,
            size: 0x10,
            existing: "A".into(),
            existing_addr: 0x08,
            existing_size: 0x10,
        };
        assert_eq!(err.to_string(), "Block B at 0x10 (+0x10) overlaps A at 0x8 (+0x10)");
    }

    #[test]
    fn test_layout_error_wraps() {
        let err: LinkError = Z64Error::IndexOutOfBounds { index: 1, len: 1 }.into();
        assert!(!err.is_usage_error());
        assert!(LinkError::Unplaced("X".into()).is_usage_error());
    }
}
