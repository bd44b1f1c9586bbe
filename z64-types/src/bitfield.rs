//! # Bitfields
//!
//! A bitfield is a single primitive word split into named sub-fields, packed
//! MSB-first in declaration order. Decoding reads the word once and slices
//! each sub-field out; when the word type is signed every sub-field is
//! sign-extended from its own width.
//!
//! Declared widths must add up to the word width exactly. A mismatch is a
//! layout bug and surfaces as [`Z64Error::BitfieldWidth`] on first use.

use std::fmt;
use std::marker::PhantomData;

use crate::codec::Codec;
use crate::enums::{EnumValue, IntEnum};
use crate::error::{Result, Z64Error};
use crate::primitive::Primitive;

/// One named sub-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub name: &'static str,
    pub width: u32,
}

impl BitField {
    pub const fn new(name: &'static str, width: u32) -> Self {
        Self { name, width }
    }
}

/// Static description of a bitfield word.
pub trait BitfieldLayout {
    type Word: Primitive;
    const NAME: &'static str;
    const FIELDS: &'static [BitField];
}

/// Sum of declared widths.
pub const fn declared_width(fields: &[BitField]) -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].width;
        i += 1;
    }
    total
}

#[inline]
const fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Split `word` into sub-field values.
pub fn unpack(word: u64, word_bits: u32, signed: bool, fields: &[BitField]) -> Vec<i64> {
    let mut values = Vec::with_capacity(fields.len());
    let mut consumed = 0;
    for field in fields {
        consumed += field.width;
        if field.width == 0 {
            values.push(0);
            continue;
        }
        let shift = word_bits - consumed;
        let raw = (word >> shift) & mask(field.width);
        let value = if signed && field.width < 64 && raw & (1 << (field.width - 1)) != 0 {
            (raw as i128 - (1i128 << field.width)) as i64
        } else {
            raw as i64
        };
        values.push(value);
    }
    values
}

/// Re-assemble a word from sub-field values; each value is masked to its width.
pub fn pack(values: &[i64], word_bits: u32, fields: &[BitField]) -> u64 {
    let mut word = 0u64;
    let mut consumed = 0;
    for (field, &value) in fields.iter().zip(values) {
        consumed += field.width;
        if field.width == 0 {
            continue;
        }
        let shift = word_bits - consumed;
        word |= (value as u64 & mask(field.width)) << shift;
    }
    word
}

pub struct Bitfield<L: BitfieldLayout> {
    values: Vec<i64>,
    _layout: PhantomData<L>,
}

impl<L: BitfieldLayout> Bitfield<L> {
    /// Check that the declared widths cover the word exactly.
    pub fn check_layout() -> Result<()> {
        let declared = declared_width(L::FIELDS);
        if declared != L::Word::BITS {
            return Err(Z64Error::BitfieldWidth {
                type_name: L::NAME,
                declared,
                width: L::Word::BITS,
            });
        }
        Ok(())
    }

    /// All sub-fields zero.
    pub fn new() -> Result<Self> {
        Self::check_layout()?;
        Ok(Self { values: vec![0; L::FIELDS.len()], _layout: PhantomData })
    }

    pub fn from_word(word: L::Word) -> Result<Self> {
        Self::check_layout()?;
        let raw = word.to_i128() as u64 & mask(L::Word::BITS);
        Ok(Self {
            values: unpack(raw, L::Word::BITS, L::Word::SIGNED, L::FIELDS),
            _layout: PhantomData,
        })
    }

    pub fn to_word(&self) -> L::Word {
        let raw = pack(&self.values, L::Word::BITS, L::FIELDS);
        L::Word::wrapping_from(raw as i128)
    }

    fn index_of(name: &str) -> Result<usize> {
        L::FIELDS
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| Z64Error::UnknownMember { type_name: L::NAME, member: name.to_string() })
    }

    pub fn get(&self, name: &str) -> Result<i64> {
        Ok(self.values[Self::index_of(name)?])
    }

    /// Set a sub-field, rejecting values that do not fit its width.
    pub fn set(&mut self, name: &str, value: i64) -> Result<()> {
        let index = Self::index_of(name)?;
        let width = L::FIELDS[index].width;
        let (min, max) = if L::Word::SIGNED {
            if width == 0 {
                (0, 0)
            } else {
                (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
            }
        } else {
            (0, (1i128 << width) - 1)
        };
        if (value as i128) < min || (value as i128) > max {
            return Err(Z64Error::OutOfRange { type_name: L::FIELDS[index].name, value: value as i128 });
        }
        self.values[index] = value;
        Ok(())
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)? != 0)
    }

    /// A signed one-bit field stores `true` as -1.
    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        let raw = match (value, L::Word::SIGNED) {
            (false, _) => 0,
            (true, false) => 1,
            (true, true) => -1,
        };
        self.set(name, raw)
    }

    pub fn get_enum<E: IntEnum>(&self, name: &str) -> Result<EnumValue<E>> {
        let raw = self.get(name)?;
        Ok(EnumValue::from_raw(E::Repr::wrapping_from(raw as i128)))
    }

    pub fn set_enum<E: IntEnum>(&mut self, name: &str, value: EnumValue<E>) -> Result<()> {
        self.set(name, value.raw().to_i128() as i64)
    }

    /// `(name, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        L::FIELDS.iter().zip(&self.values).map(|(f, &v)| (f.name, v))
    }
}

impl<L: BitfieldLayout> Clone for Bitfield<L> {
    fn clone(&self) -> Self {
        Self { values: self.values.clone(), _layout: PhantomData }
    }
}

impl<L: BitfieldLayout> PartialEq for Bitfield<L> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<L: BitfieldLayout> Eq for Bitfield<L> {}

impl<L: BitfieldLayout> fmt::Debug for Bitfield<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(L::NAME);
        for (name, value) in self.fields() {
            s.field(name, &value);
        }
        s.finish()
    }
}

impl<L: BitfieldLayout> Codec for Bitfield<L> {
    const SIZE: usize = <L::Word as Codec>::SIZE;
    const ALIGN: usize = <L::Word as Codec>::ALIGN;
    const NAME: &'static str = L::NAME;

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        Self::from_word(L::Word::read(buf, offset)?)
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        Self::check_layout()?;
        self.to_word().write(out)
    }
}
