//! # Arrays
//!
//! `Array<T, N>` has its length fixed by the type, so `Array<u8, 4>` and
//! `Array<u16, 4>` are distinct types with distinct static sizes.
//! `FlexArray<T>` is the flexible trailing member: its length is supplied at
//! decode time, and its size comes from the materialized element count.

use std::ops::{Deref, DerefMut};

use crate::codec::{slot, take, Codec};
use crate::error::{Result, Z64Error};

fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Z64Error::IndexOutOfBounds { index, len });
    }
    Ok(())
}

fn write_items<T: Codec>(items: &[T], out: &mut [u8], stable: bool) -> Result<()> {
    let mut offset = 0;
    for item in items {
        let size = item.size();
        let dst = slot(out, offset, size, T::NAME)?;
        if stable {
            item.write_stable(dst)?;
        } else {
            item.write(dst)?;
        }
        offset += size;
    }
    Ok(())
}

// ============================================================================
// Static arrays
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Array<T, const N: usize>(pub [T; N]);

impl<T, const N: usize> Array<T, N> {
    pub const LEN: usize = N;

    pub fn at(&self, index: usize) -> Result<&T> {
        check_index(index, N)?;
        Ok(&self.0[index])
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        check_index(index, N)?;
        self.0[index] = value;
        Ok(())
    }
}

impl<T: Default + Copy, const N: usize> Default for Array<T, N> {
    fn default() -> Self {
        Self([T::default(); N])
    }
}

impl<T, const N: usize> Deref for Array<T, N> {
    type Target = [T; N];

    fn deref(&self) -> &[T; N] {
        &self.0
    }
}

impl<T, const N: usize> DerefMut for Array<T, N> {
    fn deref_mut(&mut self) -> &mut [T; N] {
        &mut self.0
    }
}

impl<T: Codec, const N: usize> Codec for Array<T, N> {
    // Element stride equals element size: struct sizes are already rounded
    // up to their alignment.
    const SIZE: usize = T::SIZE * N;
    const ALIGN: usize = T::ALIGN;
    const NAME: &'static str = "array";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        take(buf, offset, Self::SIZE, Self::NAME)?;
        let mut items = Vec::with_capacity(N);
        for i in 0..N {
            items.push(T::read(buf, offset + i * T::SIZE)?);
        }
        let items: [T; N] = items
            .try_into()
            .map_err(|rest: Vec<T>| Z64Error::IndexOutOfBounds { index: rest.len(), len: N })?;
        Ok(Self(items))
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        write_items(&self.0, out, false)
    }

    fn write_stable(&self, out: &mut [u8]) -> Result<()> {
        write_items(&self.0, out, true)
    }
}

// ============================================================================
// Flexible arrays
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlexArray<T> {
    items: Vec<T>,
}

impl<T> Default for FlexArray<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> FlexArray<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn at(&self, index: usize) -> Result<&T> {
        check_index(index, self.items.len())?;
        Ok(&self.items[index])
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        check_index(index, self.items.len())?;
        self.items[index] = value;
        Ok(())
    }

    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Codec> FlexArray<T> {
    /// Decode exactly `len` contiguous elements.
    pub fn read_len(buf: &[u8], offset: usize, len: usize) -> Result<Self> {
        let needed = T::SIZE.checked_mul(len).ok_or(Z64Error::OutOfRange {
            type_name: "FlexArray",
            value: len as i128,
        })?;
        take(buf, offset, needed, T::NAME)?;
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            items.push(T::read(buf, offset + i * T::SIZE)?);
        }
        Ok(Self { items })
    }

    /// Decode elements until `is_last` accepts one; the terminator is kept.
    pub fn read_until(buf: &[u8], offset: usize, is_last: impl Fn(&T) -> bool) -> Result<Self> {
        let mut items = Vec::new();
        let mut cursor = offset;
        loop {
            let item = T::read(buf, cursor)?;
            cursor += T::SIZE;
            let done = is_last(&item);
            items.push(item);
            if done {
                return Ok(Self { items });
            }
        }
    }
}

impl<T> From<Vec<T>> for FlexArray<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<'a, T> IntoIterator for &'a FlexArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Codec> Codec for FlexArray<T> {
    const SIZE: usize = 0;
    const ALIGN: usize = T::ALIGN;
    const NAME: &'static str = "FlexArray";

    /// Always fails: use [`FlexArray::read_len`] or [`FlexArray::read_until`].
    fn read(_buf: &[u8], _offset: usize) -> Result<Self> {
        Err(Z64Error::MissingLength { type_name: Self::NAME })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        write_items(&self.items, out, false)
    }

    fn write_stable(&self, out: &mut [u8]) -> Result<()> {
        write_items(&self.items, out, true)
    }

    fn size(&self) -> usize {
        self.items.iter().map(|item| item.size()).sum()
    }
}
