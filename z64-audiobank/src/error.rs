//! Instrument bank error types

use thiserror::Error;
use z64_linker::LinkError;
use z64_types::Z64Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("Layout error: {0}")]
    Layout(#[from] Z64Error),

    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Bank {index} spans {start:#x}..{end:#x} but the audiobank is {available:#x} bytes")]
    BankOutOfRange {
        index: usize,
        start: u64,
        end: u64,
        available: usize,
    },

    #[error("Dangling {kind} handle #{index}")]
    DanglingHandle { kind: &'static str, index: u32 },
}

impl BankError {
    /// Corrupt input as opposed to a misuse of the in-memory model.
    pub fn is_structural(&self) -> bool {
        match self {
            BankError::Layout(err) => err.is_structural(),
            BankError::Link(LinkError::Layout(err)) => err.is_structural(),
            BankError::BankOutOfRange { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BankError::BankOutOfRange { index: 2, start: 0x100, end: 0x180, available: 0x120 };
        assert_eq!(err.to_string(), "Bank 2 spans 0x100..0x180 but the audiobank is 0x120 bytes");
    }

    #[test]
    fn test_is_structural() {
        let truncated = Z64Error::Truncated { type_name: "u32", offset: 0, needed: 4, available: 0 };
        assert!(BankError::from(truncated.clone()).is_structural());
        assert!(BankError::from(LinkError::from(truncated)).is_structural());
        assert!(!BankError::DanglingHandle { kind: "sample", index: 3 }.is_structural());
        assert!(!BankError::from(LinkError::Unplaced("x".into())).is_structural());
    }
}
