//! Decoded instructions

use std::fmt;

use z64_types::Result;

use crate::args::ArgValue;
use crate::opcode::{Effect, OpcodeSpec};

/// One instruction: opcode byte, its table entry and decoded arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Address of the opcode byte.
    pub addr: u32,
    pub opcode: u8,
    pub spec: &'static OpcodeSpec,
    pub args: Vec<ArgValue>,
}

impl Message {
    /// Decode the arguments following the opcode at `offset`.
    pub fn decode(buf: &[u8], offset: usize, spec: &'static OpcodeSpec) -> Result<Self> {
        let opcode = z64_types::codec::take(buf, offset, 1, spec.name)?[0];
        let mut cursor = offset + 1;
        let mut args = Vec::with_capacity(spec.args.len());
        for &shape in spec.args {
            let arg = ArgValue::read(shape, buf, cursor)?;
            cursor += arg.size();
            args.push(arg);
        }
        Ok(Self { addr: offset as u32, opcode, spec, args })
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Opcode byte plus encoded arguments.
    pub fn size(&self) -> usize {
        1 + self.args.iter().map(ArgValue::size).sum::<usize>()
    }

    /// Immediate carried in the opcode's low bits.
    pub fn argbit(&self) -> u8 {
        self.opcode - self.spec.first
    }

    pub fn effect(&self) -> Effect {
        self.spec.effect
    }

    pub fn is_terminal(&self) -> bool {
        self.spec.terminal
    }

    /// Address operand of an instruction that references another fragment.
    pub fn target(&self) -> Option<u32> {
        if !self.spec.effect.follows_target() {
            return None;
        }
        match self.args.first()? {
            ArgValue::U16(addr) => Some(*addr as u32),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec.name)?;
        let mut sep = " ";
        if self.spec.is_argbit() {
            write!(f, "{sep}{}", self.argbit())?;
            sep = ", ";
        }
        for arg in &self.args {
            write!(f, "{sep}{arg}")?;
            sep = ", ";
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::section::Section;
    use crate::version::AseqVersion;

    fn spec(section: Section, opcode: u8, legato: bool) -> &'static OpcodeSpec {
        Registry::standard().lookup(section, opcode, AseqVersion::Oot, legato).unwrap()
    }

    #[test]
    fn test_decode_load_channel() {
        let buf = [0x93, 0x01, 0x20];
        let msg = Message::decode(&buf, 0, spec(Section::Meta, 0x93, false)).unwrap();
        assert_eq!(msg.name(), "ldchan");
        assert_eq!(msg.argbit(), 3);
        assert_eq!(msg.size(), 3);
        assert_eq!(msg.target(), Some(0x120));
        assert_eq!(msg.effect(), Effect::LoadChannel);
        assert_eq!(msg.to_string(), "ldchan 3, 0x0120");
    }

    #[test]
    fn test_size_counts_varint() {
        let buf = [0x00, 0x00, 0x85, 0x2A, 0x40, 0x7F];
        let msg = Message::decode(&buf, 1, spec(Section::Layer, 0x00, true)).unwrap();
        assert_eq!(msg.name(), "notedvg");
        assert_eq!(msg.size(), 5);
        assert_eq!(msg.addr, 1);
        assert_eq!(msg.to_string(), "notedvg 0, 1322, 64, 127");
    }

    #[test]
    fn test_branch_has_no_target() {
        let msg = Message::decode(&[0xFB, 0x00, 0x10], 0, spec(Section::Meta, 0xFB, false)).unwrap();
        assert!(!msg.is_terminal());
        assert_eq!(msg.target(), None);
        assert_eq!(msg.to_string(), "jump 0x0010");
    }

    #[test]
    fn test_truncated_args() {
        let err = Message::decode(&[0xFC, 0x00], 0, spec(Section::Channel, 0xFC, false)).unwrap_err();
        assert!(err.is_structural());
    }
}
