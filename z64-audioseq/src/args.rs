//! # Argument shapes
//!
//! Every instruction argument is one of a handful of shapes. Fixed shapes
//! are plain big-endian integers; `Var` is the 1-or-2 byte varint and
//! `Portamento` is a mode byte, a note byte and a time whose encoding is
//! selected by the mode's high bit.

use std::fmt;

use z64_types::codec::take;
use z64_types::{Codec, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgShape {
    U8,
    S8,
    U16,
    S16,
    Var,
    Portamento,
}

/// Variable-length unsigned integer: one byte below 0x80, else a 15-bit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarInt {
    pub value: u16,
    /// Encoded size in bytes, 1 or 2.
    pub size: u8,
}

impl VarInt {
    pub const NAME: &'static str = "var";

    pub fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let b0 = take(buf, offset, 1, Self::NAME)?[0];
        if b0 & 0x80 == 0 {
            return Ok(Self { value: b0 as u16, size: 1 });
        }
        let b1 = take(buf, offset + 1, 1, Self::NAME)?[0];
        Ok(Self {
            value: (((b0 as u16) << 8) & 0x7F00) | b1 as u16,
            size: 2,
        })
    }

    /// Shortest encoding for `value`, which must fit in 15 bits.
    pub fn encode(value: u16) -> Vec<u8> {
        if value < 0x80 {
            vec![value as u8]
        } else {
            vec![0x80 | ((value >> 8) as u8 & 0x7F), value as u8]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgValue {
    U8(u8),
    S8(i8),
    U16(u16),
    S16(i16),
    Var(VarInt),
    Portamento { mode: u8, note: u8, time: VarInt },
}

impl ArgValue {
    pub fn read(shape: ArgShape, buf: &[u8], offset: usize) -> Result<Self> {
        Ok(match shape {
            ArgShape::U8 => ArgValue::U8(u8::read(buf, offset)?),
            ArgShape::S8 => ArgValue::S8(i8::read(buf, offset)?),
            ArgShape::U16 => ArgValue::U16(u16::read(buf, offset)?),
            ArgShape::S16 => ArgValue::S16(i16::read(buf, offset)?),
            ArgShape::Var => ArgValue::Var(VarInt::read(buf, offset)?),
            ArgShape::Portamento => {
                let mode = u8::read(buf, offset)?;
                let note = u8::read(buf, offset + 1)?;
                let time = if mode & 0x80 != 0 {
                    VarInt { value: u8::read(buf, offset + 2)? as u16, size: 1 }
                } else {
                    VarInt::read(buf, offset + 2)?
                };
                ArgValue::Portamento { mode, note, time }
            }
        })
    }

    pub fn size(&self) -> usize {
        match self {
            ArgValue::U8(_) | ArgValue::S8(_) => 1,
            ArgValue::U16(_) | ArgValue::S16(_) => 2,
            ArgValue::Var(v) => v.size as usize,
            ArgValue::Portamento { time, .. } => 2 + time.size as usize,
        }
    }

    /// Numeric value of a scalar argument.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            ArgValue::U8(v) => Some(v as i32),
            ArgValue::S8(v) => Some(v as i32),
            ArgValue::U16(v) => Some(v as i32),
            ArgValue::S16(v) => Some(v as i32),
            ArgValue::Var(v) => Some(v.value as i32),
            ArgValue::Portamento { .. } => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::U8(v) => write!(f, "{v}"),
            ArgValue::S8(v) => write!(f, "{v}"),
            ArgValue::U16(v) => write!(f, "0x{v:04X}"),
            ArgValue::S16(v) => write!(f, "{v}"),
            ArgValue::Var(v) => write!(f, "{}", v.value),
            ArgValue::Portamento { mode, note, time } => {
                write!(f, "0x{mode:02X}, {note}, {}", time.value)
            }
        }
    }
}
