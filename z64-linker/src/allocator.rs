//! # Allocator
//!
//! Hands out addresses for blocks. Cursor allocation places each block at the
//! next aligned address after the previous one; explicit placement pins a
//! block to a caller-chosen address. Every placement is checked against all
//! earlier ones, so two blocks can never share a byte.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

use tracing::trace;

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};

/// Key naming a block.
pub trait Symbol: Copy + Eq + Hash + Ord + fmt::Debug {}

impl<T: Copy + Eq + Hash + Ord + fmt::Debug> Symbol for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub addr: u32,
    pub size: u32,
}

impl Placement {
    #[inline]
    pub fn end(&self) -> u64 {
        self.addr as u64 + self.size as u64
    }
}

#[derive(Debug, Clone)]
pub struct Allocator<K> {
    config: LinkConfig,
    cursor: u64,
    placements: HashMap<K, Placement>,
    // Start address of every non-empty block.
    spans: BTreeMap<u64, K>,
}

impl<K: Symbol> Allocator<K> {
    pub fn new(config: LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cursor: config.start as u64,
            placements: HashMap::new(),
            spans: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Move the cursor forward to at least `addr`.
    pub fn advance_to(&mut self, addr: u64) {
        self.cursor = self.cursor.max(addr);
    }

    pub fn address_of(&self, key: K) -> Option<u32> {
        self.placements.get(&key).map(|p| p.addr)
    }

    pub fn placement(&self, key: K) -> Option<Placement> {
        self.placements.get(&key).copied()
    }

    /// Highest `addr + size` over all blocks.
    pub fn end(&self) -> u64 {
        self.placements.values().map(Placement::end).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Pin `key` at `addr`.
    pub fn place(&mut self, key: K, addr: u32, size: usize) -> Result<u32> {
        if self.placements.contains_key(&key) {
            return Err(LinkError::DuplicateSymbol(format!("{:?}", key)));
        }
        let size = u32::try_from(size)
            .ok()
            .filter(|&s| addr as u64 + s as u64 <= u32::MAX as u64 + 1)
            .ok_or_else(|| LinkError::AddressSpace { symbol: format!("{:?}", key), size: size as u64 })?;

        let start = addr as u64;
        let end = start + size as u64;
        if size > 0 {
            if let Some((&other_start, &other)) = self.spans.range(..end).next_back() {
                let other_end = self.placements[&other].end();
                if other_end > start {
                    return Err(LinkError::Overlap {
                        symbol: format!("{:?}", key),
                        addr: start,
                        size: size as u64,
                        existing: format!("{:?}", other),
                        existing_addr: other_start,
                        existing_size: other_end - other_start,
                    });
                }
            }
            self.spans.insert(start, key);
        }
        self.placements.insert(key, Placement { addr, size });
        trace!(symbol = ?key, addr = format_args!("{:#x}", addr), size, "placed block");
        Ok(addr)
    }

    /// Place `key` at the next cursor address aligned to the configured alignment.
    pub fn reserve(&mut self, key: K, size: usize) -> Result<u32> {
        self.reserve_aligned(key, size, self.config.alignment)
    }

    pub fn reserve_aligned(&mut self, key: K, size: usize, align: u32) -> Result<u32> {
        let align = align.max(1) as u64;
        let addr = (self.cursor + align - 1) / align * align;
        let addr = u32::try_from(addr)
            .map_err(|_| LinkError::AddressSpace { symbol: format!("{:?}", key), size: size as u64 })?;
        self.place(key, addr, size)?;
        self.cursor = addr as u64 + size as u64;
        Ok(addr)
    }

    /// All placements ordered by address.
    pub fn placements(&self) -> Vec<(K, Placement)> {
        let mut all: Vec<_> = self.placements.iter().map(|(&k, &p)| (k, p)).collect();
        all.sort_by_key(|&(k, p)| (p.addr, k));
        all
    }
}
