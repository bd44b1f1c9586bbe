//! # Arena
//!
//! Parsed objects live in one arena per type, indexed by a typed [`Handle`].
//! Objects read from a buffer are interned by source address, so the same
//! address decoded twice yields the same handle and pointer identity survives
//! parsing.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use crate::error::Result;
use crate::pointer::Pointer;

pub struct Handle<T> {
    index: u32,
    _target: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub const fn from_index(index: u32) -> Self {
        Self { index, _target: PhantomData }
    }

    pub const fn index(self) -> u32 {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
    sources: Vec<Option<u32>>,
    by_addr: HashMap<u32, Handle<T>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new(), sources: Vec::new(), by_addr: HashMap::new() }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an object that was built in memory rather than read from a buffer.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let handle = Handle::from_index(self.items.len() as u32);
        self.items.push(value);
        self.sources.push(None);
        handle
    }

    fn insert_at(&mut self, addr: u32, value: T) -> Handle<T> {
        let handle = self.insert(value);
        self.sources[handle.index as usize] = Some(addr);
        self.by_addr.insert(addr, handle);
        handle
    }

    /// Decode the object at `addr` once; later loads of the same address reuse it.
    ///
    /// Address 0 and addresses past the end of `buf` are null.
    pub fn load<F>(&mut self, buf: &[u8], addr: u32, read: F) -> Result<Option<Handle<T>>>
    where
        F: FnOnce(&[u8], usize) -> Result<T>,
    {
        if addr == 0 || addr as usize >= buf.len() {
            return Ok(None);
        }
        if let Some(&handle) = self.by_addr.get(&addr) {
            return Ok(Some(handle));
        }
        let value = read(buf, addr as usize)?;
        Ok(Some(self.insert_at(addr, value)))
    }

    /// Handle of the object built for `addr`, creating it with `make` on first use.
    ///
    /// The flag is true when the object was created by this call.
    pub fn intern<F>(&mut self, addr: u32, make: F) -> (Handle<T>, bool)
    where
        F: FnOnce() -> T,
    {
        match self.by_addr.get(&addr) {
            Some(&handle) => (handle, false),
            None => (self.insert_at(addr, make()), true),
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index as usize)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.index as usize)
    }

    /// Object a resolved pointer refers to.
    pub fn follow(&self, pointer: &Pointer<T>) -> Option<&T> {
        pointer.target().and_then(|handle| self.get(handle))
    }

    /// Address the object was decoded from, if any.
    pub fn source_addr(&self, handle: Handle<T>) -> Option<u32> {
        self.sources.get(handle.index as usize).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (Handle::from_index(i as u32), item))
    }
}

impl<T> Index<Handle<T>> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        &self.items[handle.index as usize]
    }
}

impl<T> IndexMut<Handle<T>> for Arena<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        &mut self.items[handle.index as usize]
    }
}
