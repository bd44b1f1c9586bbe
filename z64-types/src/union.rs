//! # Unions
//!
//! A union overlays several named alternatives on one byte span. Nothing in
//! the bytes says which alternative is meant, so decoding keeps the raw span
//! and any member can be viewed on demand. Writing emits only the active
//! member, zero-padded up to the union size or truncated down to it.

use std::fmt;
use std::marker::PhantomData;

use crate::codec::{slot, take, Codec};
use crate::error::{Result, Z64Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionMember {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
}

impl UnionMember {
    pub const fn of<T: Codec>(name: &'static str) -> Self {
        Self { name, size: T::SIZE, align: T::ALIGN }
    }
}

pub trait UnionLayout {
    const NAME: &'static str;
    /// Declared span; usually the largest member.
    const SIZE: usize;
    const MEMBERS: &'static [UnionMember];
}

/// Largest member alignment, at least 1.
pub const fn members_align(members: &[UnionMember]) -> usize {
    let mut align = 1;
    let mut i = 0;
    while i < members.len() {
        if members[i].align > align {
            align = members[i].align;
        }
        i += 1;
    }
    align
}

pub struct Union<L: UnionLayout> {
    raw: Vec<u8>,
    active: usize,
    _layout: PhantomData<L>,
}

impl<L: UnionLayout> Union<L> {
    /// All-zero span with the first member active.
    pub fn zeroed() -> Self {
        Self { raw: vec![0; L::SIZE], active: 0, _layout: PhantomData }
    }

    fn index_of(name: &str) -> Result<usize> {
        L::MEMBERS
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| Z64Error::UnknownMember { type_name: L::NAME, member: name.to_string() })
    }

    pub fn active(&self) -> &'static str {
        L::MEMBERS.get(self.active).map_or("", |m| m.name)
    }

    /// Decode the span as member `name`.
    pub fn get<T: Codec>(&self, name: &str) -> Result<T> {
        Self::index_of(name)?;
        T::read(&self.raw, 0)
    }

    /// Store `value` as member `name` and make it active.
    pub fn set<T: Codec>(&mut self, name: &str, value: &T) -> Result<()> {
        let index = Self::index_of(name)?;
        let mut bytes = value.to_bytes()?;
        bytes.resize(L::SIZE, 0);
        self.raw = bytes;
        self.active = index;
        Ok(())
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

impl<L: UnionLayout> Clone for Union<L> {
    fn clone(&self) -> Self {
        Self { raw: self.raw.clone(), active: self.active, _layout: PhantomData }
    }
}

impl<L: UnionLayout> PartialEq for Union<L> {
    fn eq(&self, other: &Self) -> bool {
        self.active == other.active && self.raw == other.raw
    }
}

impl<L: UnionLayout> fmt::Debug for Union<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(L::NAME)
            .field("active", &self.active())
            .field("raw", &self.raw)
            .finish()
    }
}

impl<L: UnionLayout> Codec for Union<L> {
    const SIZE: usize = L::SIZE;
    const ALIGN: usize = members_align(L::MEMBERS);
    const NAME: &'static str = L::NAME;

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let raw = take(buf, offset, L::SIZE, L::NAME)?.to_vec();
        Ok(Self { raw, active: 0, _layout: PhantomData })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        let dst = slot(out, 0, L::SIZE, L::NAME)?;
        dst.fill(0);
        let member_size = L::MEMBERS.get(self.active).map_or(L::SIZE, |m| m.size);
        let n = member_size.min(L::SIZE);
        dst[..n].copy_from_slice(&self.raw[..n]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Word;
    impl UnionLayout for Word {
        const NAME: &'static str = "Word";
        const SIZE: usize = 4;
        const MEMBERS: &'static [UnionMember] = &[
            UnionMember::of::<u32>("value"),
            UnionMember::of::<u16>("half"),
            UnionMember::of::<f32>("real"),
        ];
    }

    #[test]
    fn test_all_members_view_same_bytes() {
        let u = Union::<Word>::read(&[0x3F, 0x80, 0x00, 0x00], 0).unwrap();
        assert_eq!(u.get::<u32>("value").unwrap(), 0x3F80_0000);
        assert_eq!(u.get::<u16>("half").unwrap(), 0x3F80);
        assert_eq!(u.get::<f32>("real").unwrap(), 1.0);
        assert_eq!(u.active(), "value");
        assert!(u.get::<u32>("missing").is_err());
    }

    #[test]
    fn test_write_pads_smaller_active_member() {
        let mut u = Union::<Word>::read(&[0xAA, 0xBB, 0xCC, 0xDD], 0).unwrap();
        u.set("half", &0x1234u16).unwrap();
        assert_eq!(u.active(), "half");
        assert_eq!(u.to_bytes().unwrap(), vec![0x12, 0x34, 0x00, 0x00]);
    }

    #[test]
    fn test_write_truncates_larger_value() {
        let mut u = Union::<Word>::zeroed();
        u.set("value", &0x0102_0304_0506_0708u64).unwrap();
        assert_eq!(u.to_bytes().unwrap(), vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_alignment_is_max_member() {
        assert_eq!(<Union<Word> as Codec>::ALIGN, 4);
        assert_eq!(<Union<Word> as Codec>::SIZE, 4);
    }
}
