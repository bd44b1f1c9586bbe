//! # Link Configuration

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placement parameters for one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkConfig {
    /// First address handed out by cursor allocation.
    pub start: u32,
    /// Alignment of every cursor-allocated block and of the final buffer size.
    pub alignment: u32,
    /// Coalesce blocks with identical content.
    pub deduplicate: bool,
}

impl LinkConfig {
    /// Audiobank conventions: 16-byte blocks after a 16-byte header area.
    pub const DEFAULT: Self = Self {
        start: 0x10,
        alignment: 0x10,
        deduplicate: true,
    };

    pub const fn new(start: u32, alignment: u32, deduplicate: bool) -> Result<Self, ConfigError> {
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(ConfigError::InvalidAlignment(alignment));
        }
        if start % alignment != 0 {
            return Err(ConfigError::UnalignedStart { start, alignment });
        }
        Ok(Self { start, alignment, deduplicate })
    }

    #[inline]
    pub const fn align(&self, addr: u64) -> u64 {
        let a = self.alignment as u64;
        (addr + a - 1) & !(a - 1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::new(self.start, self.alignment, self.deduplicate).map(|_| ())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for LinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LinkConfig {{ start: {:#x}, alignment: {:#x}, dedup: {} }}",
            self.start, self.alignment, self.deduplicate
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("alignment {0:#x} must be a non-zero power of two")]
    InvalidAlignment(u32),
    #[error("start {start:#x} is not aligned to {alignment:#x}")]
    UnalignedStart { start: u32, alignment: u32 },
}
