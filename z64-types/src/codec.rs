//! # Codec
//!
//! The contract every typed value in a binary layout implements: a static
//! size and alignment known before any instance exists, a bounds-checked
//! big-endian decode at a buffer offset, and an encode into a caller-provided
//! slot. Dynamically sized types (flexible arrays, structs with a trailing
//! flexible member) report their fixed head in `SIZE` and override `size()`.

use crate::error::{Result, Z64Error};

pub trait Codec: Sized {
    /// Size in bytes of the fixed part of the type.
    const SIZE: usize;
    /// Natural alignment in bytes.
    const ALIGN: usize;
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Decode a value starting at `offset`.
    fn read(buf: &[u8], offset: usize) -> Result<Self>;

    /// Encode into `out`, which must hold at least `self.size()` bytes.
    fn write(&self, out: &mut [u8]) -> Result<()>;

    /// Encode with every pointer replaced by a fixed sentinel.
    ///
    /// Only used for content equality; never written to disk.
    fn write_stable(&self, out: &mut [u8]) -> Result<()> {
        self.write(out)
    }

    /// Instance size; differs from `SIZE` only for dynamically sized types.
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.size()];
        self.write(&mut out)?;
        Ok(out)
    }

    fn stable_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.size()];
        self.write_stable(&mut out)?;
        Ok(out)
    }
}

/// Borrow `needed` bytes at `offset`, failing with `Truncated` if the buffer is short.
pub fn take<'a>(buf: &'a [u8], offset: usize, needed: usize, type_name: &'static str) -> Result<&'a [u8]> {
    offset
        .checked_add(needed)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| Z64Error::truncated(type_name, offset, needed, buf.len()))
}

/// Mutable counterpart of [`take`] used by encoders.
pub fn slot<'a>(out: &'a mut [u8], offset: usize, needed: usize, type_name: &'static str) -> Result<&'a mut [u8]> {
    let len = out.len();
    offset
        .checked_add(needed)
        .and_then(move |end| out.get_mut(offset..end))
        .ok_or_else(|| Z64Error::truncated(type_name, offset, needed, len))
}

/// Round `offset` up to the next multiple of `align`.
#[inline]
pub const fn align_to(offset: usize, align: usize) -> usize {
    if align <= 1 {
        offset
    } else {
        (offset + align - 1) / align * align
    }
}
