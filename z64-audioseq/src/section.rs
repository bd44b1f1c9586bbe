//! Instruction-stream sections. Each has its own opcode table.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    Meta,
    Channel,
    Layer,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Meta, Section::Channel, Section::Layer];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Section::Meta => "meta",
            Section::Channel => "channel",
            Section::Layer => "layer",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bit set of sections an opcode is valid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionSet(u8);

impl SectionSet {
    pub const META: Self = Self(1 << Section::Meta as u8);
    pub const CHANNEL: Self = Self(1 << Section::Channel as u8);
    pub const LAYER: Self = Self(1 << Section::Layer as u8);
    pub const META_CHANNEL: Self = Self(Self::META.0 | Self::CHANNEL.0);
    pub const ALL: Self = Self(Self::META.0 | Self::CHANNEL.0 | Self::LAYER.0);

    pub const fn contains(self, section: Section) -> bool {
        self.0 & (1 << section as u8) != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Section> {
        Section::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}
