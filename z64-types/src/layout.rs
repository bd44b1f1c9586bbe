//! # Struct Layout
//!
//! Field offsets follow C natural alignment: each field starts at the next
//! multiple of its alignment, the struct aligns to its widest field (or an
//! explicit override), and the total size is rounded up to that alignment.
//! Layouts are computed in const context, once per type.
//!
//! ```
//! use z64_types::{FieldDecl, StructLayout};
//!
//! const LAYOUT: StructLayout<3> = StructLayout::new("Example", [
//!     FieldDecl::of::<u8>("a"),
//!     FieldDecl::of::<u32>("b"),
//!     FieldDecl::of::<u16>("c"),
//! ]);
//! assert_eq!(LAYOUT.offsets, [0, 4, 8]);
//! assert_eq!(LAYOUT.size, 12);
//! ```

use crate::codec::{align_to, slot, take, Codec};
use crate::error::{Result, Z64Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
}

impl FieldDecl {
    pub const fn of<T: Codec>(name: &'static str) -> Self {
        Self { name, size: T::SIZE, align: T::ALIGN }
    }

    /// Raw bytes with no alignment requirement.
    pub const fn padding(name: &'static str, size: usize) -> Self {
        Self { name, size, align: 1 }
    }

    /// Raise the field's alignment (C `alignas`).
    pub const fn aligned(self, align: usize) -> Self {
        Self {
            name: self.name,
            size: self.size,
            align: if align > self.align { align } else { self.align },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructLayout<const N: usize> {
    pub name: &'static str,
    pub fields: [FieldDecl; N],
    pub offsets: [usize; N],
    pub size: usize,
    pub align: usize,
}

impl<const N: usize> StructLayout<N> {
    pub const fn new(name: &'static str, fields: [FieldDecl; N]) -> Self {
        Self::build(name, fields, 0, 0)
    }

    /// Struct-level alignment override; the size is rounded up to it.
    pub const fn with_align(name: &'static str, fields: [FieldDecl; N], align: usize) -> Self {
        Self::build(name, fields, align, 0)
    }

    /// Cap every field's alignment at `pack` (C `#pragma pack`).
    pub const fn packed(name: &'static str, fields: [FieldDecl; N], pack: usize) -> Self {
        Self::build(name, fields, 0, pack)
    }

    const fn build(name: &'static str, fields: [FieldDecl; N], align_override: usize, pack: usize) -> Self {
        let mut offsets = [0usize; N];
        let mut cursor = 0;
        let mut align = 1;
        let mut i = 0;
        while i < N {
            let mut field_align = fields[i].align;
            if pack > 0 && field_align > pack {
                field_align = pack;
            }
            cursor = align_to(cursor, field_align);
            offsets[i] = cursor;
            cursor += fields[i].size;
            if field_align > align {
                align = field_align;
            }
            i += 1;
        }
        if align_override > align {
            align = align_override;
        }
        Self { name, fields, offsets, size: align_to(cursor, align), align }
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| self.offsets[i])
    }

    /// Sequential decoder over the fields of one instance at `base`.
    pub fn reader<'a>(&'a self, buf: &'a [u8], base: usize) -> Result<FieldReader<'a, N>> {
        take(buf, base, self.size, self.name)?;
        Ok(FieldReader { layout: self, buf, base, index: 0 })
    }

    /// Sequential encoder; zero-fills the struct span first.
    pub fn writer<'a>(&'a self, out: &'a mut [u8], stable: bool) -> Result<FieldWriter<'a, N>> {
        let span = slot(out, 0, self.size, self.name)?;
        span.fill(0);
        Ok(FieldWriter { layout: self, out: span, index: 0, stable })
    }
}

pub struct FieldReader<'a, const N: usize> {
    layout: &'a StructLayout<N>,
    buf: &'a [u8],
    base: usize,
    index: usize,
}

impl<'a, const N: usize> FieldReader<'a, N> {
    fn advance(&mut self) -> Result<usize> {
        if self.index >= N {
            return Err(Z64Error::IndexOutOfBounds { index: self.index, len: N });
        }
        let offset = self.base + self.layout.offsets[self.index];
        self.index += 1;
        Ok(offset)
    }

    pub fn next<T: Codec>(&mut self) -> Result<T> {
        let offset = self.advance()?;
        T::read(self.buf, offset)
    }

    /// Skip a padding field.
    pub fn skip(&mut self) -> Result<()> {
        self.advance().map(|_| ())
    }

    /// First byte after the fixed part of the struct.
    pub fn end(&self) -> usize {
        self.base + self.layout.size
    }
}

pub struct FieldWriter<'a, const N: usize> {
    layout: &'a StructLayout<N>,
    out: &'a mut [u8],
    index: usize,
    stable: bool,
}

impl<'a, const N: usize> FieldWriter<'a, N> {
    fn advance(&mut self) -> Result<FieldDecl> {
        if self.index >= N {
            return Err(Z64Error::IndexOutOfBounds { index: self.index, len: N });
        }
        let decl = self.layout.fields[self.index];
        self.index += 1;
        Ok(decl)
    }

    pub fn put<T: Codec>(&mut self, value: &T) -> Result<()> {
        let index = self.index;
        let decl = self.advance()?;
        let dst = slot(&mut *self.out, self.layout.offsets[index], decl.size, decl.name)?;
        if self.stable {
            value.write_stable(dst)
        } else {
            value.write(dst)
        }
    }

    /// Leave a padding field zeroed.
    pub fn pad(&mut self) -> Result<()> {
        self.advance().map(|_| ())
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }
}
