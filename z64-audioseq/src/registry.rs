//! # Opcode registry
//!
//! Immutable lookup from `(section, opcode byte)` to candidate
//! [`OpcodeSpec`]s, built once from a static table and handed to the parser
//! by reference. Candidates are filtered by format version and, for
//! note-layer opcodes below `0xC0`, by the stream's current note mode.

use std::sync::OnceLock;

use crate::error::{Result, SequenceError};
use crate::opcode::{OpcodeSpec, OPCODES};
use crate::section::Section;
use crate::version::AseqVersion;

/// First note-layer opcode whose meaning does not depend on note mode.
pub const LAYER_MODE_LIMIT: u8 = 0xC0;

#[derive(Debug, Clone)]
pub struct Registry {
    candidates: Vec<Vec<&'static OpcodeSpec>>,
}

impl Registry {
    /// Build and check a registry: every range is non-empty and no opcode
    /// byte has two candidates that could both apply to one stream.
    pub fn from_specs(specs: &'static [OpcodeSpec]) -> Result<Self> {
        let mut registry = Self::empty();
        for spec in specs {
            if spec.first > spec.last {
                return Err(SequenceError::EmptyRange { name: spec.name, first: spec.first, last: spec.last });
            }
            for section in spec.sections.iter() {
                for opcode in spec.first..=spec.last {
                    let clash = registry.slot(section, opcode).iter().find(|other| {
                        other.compat.overlaps(spec.compat)
                            && (!mode_sensitive(section, opcode) || other.note_mode.overlaps(spec.note_mode))
                    });
                    if let Some(other) = clash {
                        return Err(SequenceError::Ambiguous {
                            section: section.name(),
                            opcode,
                            first: other.name,
                            second: spec.name,
                        });
                    }
                    registry.push(section, opcode, spec);
                }
            }
        }
        Ok(registry)
    }

    /// The built-in table shared by every parse.
    pub fn standard() -> &'static Registry {
        static STANDARD: OnceLock<Registry> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let mut registry = Self::empty();
            for spec in OPCODES {
                for section in spec.sections.iter() {
                    for opcode in spec.first..=spec.last {
                        registry.push(section, opcode, spec);
                    }
                }
            }
            registry
        })
    }

    /// First candidate valid for this version and note mode.
    pub fn lookup(&self, section: Section, opcode: u8, version: AseqVersion, legato: bool) -> Option<&'static OpcodeSpec> {
        let sensitive = mode_sensitive(section, opcode);
        self.slot(section, opcode)
            .iter()
            .copied()
            .find(|spec| spec.compat.includes(version) && (!sensitive || spec.note_mode.accepts(legato)))
    }

    pub fn candidates(&self, section: Section, opcode: u8) -> &[&'static OpcodeSpec] {
        self.slot(section, opcode)
    }

    fn empty() -> Self {
        Self { candidates: vec![Vec::new(); Section::ALL.len() * 256] }
    }

    fn slot(&self, section: Section, opcode: u8) -> &[&'static OpcodeSpec] {
        &self.candidates[section.index() * 256 + opcode as usize]
    }

    fn push(&mut self, section: Section, opcode: u8, spec: &'static OpcodeSpec) {
        self.candidates[section.index() * 256 + opcode as usize].push(spec);
    }
}

fn mode_sensitive(section: Section, opcode: u8) -> bool {
    section == Section::Layer && opcode < LAYER_MODE_LIMIT
}
