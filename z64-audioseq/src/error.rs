//! Sequence decoder errors

use thiserror::Error;
use z64_types::Z64Error;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error(transparent)]
    Layout(#[from] Z64Error),

    #[error("Invalid parser configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Opcode spec `{name}` has an empty range {first:#04x}..={last:#04x}")]
    EmptyRange { name: &'static str, first: u8, last: u8 },

    #[error("Opcodes `{first}` and `{second}` both claim {opcode:#04x} in the {section} section")]
    Ambiguous {
        section: &'static str,
        opcode: u8,
        first: &'static str,
        second: &'static str,
    },

    #[error("Sequence exceeds {limit} fragments")]
    FragmentLimit { limit: usize },
}

impl SequenceError {
    /// See [`Z64Error::is_structural`]. Opcode misses never reach this type.
    pub fn is_structural(&self) -> bool {
        match self {
            SequenceError::Layout(err) => err.is_structural(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SequenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SequenceError::Ambiguous { section: "layer", opcode: 0x40, first: "notedv", second: "shortdv" };
        assert_eq!(
            err.to_string(),
            "Opcodes `notedv` and `shortdv` both claim 0x40 in the layer section"
        );
        assert_eq!(SequenceError::FragmentLimit { limit: 8 }.to_string(), "Sequence exceeds 8 fragments");
    }

    #[test]
    fn test_is_structural() {
        let truncated = Z64Error::Truncated { type_name: "u16", offset: 3, needed: 2, available: 1 };
        assert!(SequenceError::from(truncated).is_structural());
        assert!(!SequenceError::FragmentLimit { limit: 1 }.is_structural());
    }
}
