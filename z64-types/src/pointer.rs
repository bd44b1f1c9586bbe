//! # Pointers
//!
//! A pointer is a 32-bit offset into the buffer it was read from. It keeps the
//! raw offset exactly as decoded and, once the owning model resolves it, the
//! arena handle of the object it points at. The handle is what survives
//! recompilation; the raw offset is only meaningful for the source buffer.

use std::fmt;

use crate::arena::Handle;
use crate::codec::{slot, Codec};
use crate::error::{Result, Z64Error};

/// Written in place of every pointer when computing stable bytes.
pub const STABLE_SENTINEL: u32 = 0xFFFF_FFFF;

pub struct Pointer<T> {
    addr: u32,
    target: Option<Handle<T>>,
}

impl<T> Pointer<T> {
    pub const fn new(addr: u32) -> Self {
        Self { addr, target: None }
    }

    pub const fn null() -> Self {
        Self::new(0)
    }

    /// Pointer to an in-memory object with no source address yet.
    pub const fn to(target: Handle<T>) -> Self {
        Self { addr: 0, target: Some(target) }
    }

    pub const fn addr(&self) -> u32 {
        self.addr
    }

    pub const fn is_null(&self) -> bool {
        self.addr == 0 && self.target.is_none()
    }

    pub fn target(&self) -> Option<Handle<T>> {
        self.target
    }

    pub fn bind(&mut self, target: Option<Handle<T>>) {
        self.target = target;
    }
}

impl<T: Codec> Pointer<T> {
    /// Move by `n` elements of `T`.
    pub fn offset(&self, n: i64) -> Result<Self> {
        let delta = n as i128 * T::SIZE as i128;
        let addr = self.addr as i128 + delta;
        if !(0..=u32::MAX as i128).contains(&addr) {
            return Err(Z64Error::OutOfRange { type_name: "pointer", value: addr });
        }
        Ok(Self::new(addr as u32))
    }

    /// Decode the target from `buf`.
    ///
    /// Offset 0 and offsets at or past the end of `buf` are null; anything
    /// else is a bounds-checked read.
    pub fn deref(&self, buf: &[u8]) -> Result<Option<T>> {
        if self.addr == 0 || self.addr as usize >= buf.len() {
            return Ok(None);
        }
        T::read(buf, self.addr as usize).map(Some)
    }
}

impl<T> Default for Pointer<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Clone for Pointer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Pointer<T> {}

impl<T> PartialEq for Pointer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr && self.target == other.target
    }
}

impl<T> Eq for Pointer<T> {}

impl<T> fmt::Debug for Pointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(target) => write!(f, "Pointer({:#x} -> {:?})", self.addr, target),
            None => write!(f, "Pointer({:#x})", self.addr),
        }
    }
}

impl<T> Codec for Pointer<T> {
    const SIZE: usize = 4;
    const ALIGN: usize = 4;
    const NAME: &'static str = "pointer";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        Ok(Self::new(u32::read(buf, offset)?))
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.addr.write(out)
    }

    fn write_stable(&self, out: &mut [u8]) -> Result<()> {
        slot(out, 0, 4, Self::NAME)?.copy_from_slice(&STABLE_SENTINEL.to_be_bytes());
        Ok(())
    }
}
