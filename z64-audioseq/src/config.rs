//! # Parser Configuration

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::AseqVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Opcode table revision to decode against.
    pub version: AseqVersion,
    /// Upper bound on distinct fragments decoded from one sequence.
    pub max_fragments: usize,
}

impl ParserConfig {
    pub const DEFAULT: Self = Self {
        version: AseqVersion::Oot,
        max_fragments: 0x1_0000,
    };

    pub const fn new(version: AseqVersion, max_fragments: usize) -> Result<Self, ConfigError> {
        if max_fragments == 0 {
            return Err(ConfigError::NoFragments);
        }
        Ok(Self { version, max_fragments })
    }

    pub const fn with_version(version: AseqVersion) -> Self {
        Self { version, ..Self::DEFAULT }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::new(self.version, self.max_fragments).map(|_| ())
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParserConfig {{ version: {}, max_fragments: {} }}",
            self.version, self.max_fragments
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_fragments must be at least 1")]
    NoFragments,
}
