//! # Linker
//!
//! Two passes. First every block gets an address through the [`Allocator`];
//! then [`Linker::link`] patches each relocation with its target's final
//! address and copies the blocks into one zero-filled image. Targets may be
//! placed after the blocks that point at them, since nothing is patched until
//! all addresses are known.

use std::collections::HashSet;

use tracing::debug;
use z64_types::codec::slot;

use crate::allocator::{Allocator, Placement, Symbol};
use crate::config::LinkConfig;
use crate::error::{LinkError, Result};

/// A 32-bit big-endian pointer slot inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation<K> {
    pub offset: usize,
    /// `None` links as address 0.
    pub target: Option<K>,
}

impl<K> Relocation<K> {
    pub fn new(offset: usize, target: Option<K>) -> Self {
        Self { offset, target }
    }
}

#[derive(Debug, Clone)]
struct Block<K> {
    key: K,
    bytes: Vec<u8>,
    relocs: Vec<Relocation<K>>,
}

#[derive(Debug, Clone)]
pub struct Linker<K> {
    allocator: Allocator<K>,
    blocks: Vec<Block<K>>,
    defined: HashSet<K>,
}

impl<K: Symbol> Linker<K> {
    pub fn new(config: LinkConfig) -> Result<Self> {
        Ok(Self {
            allocator: Allocator::new(config)?,
            blocks: Vec::new(),
            defined: HashSet::new(),
        })
    }

    pub fn allocator(&self) -> &Allocator<K> {
        &self.allocator
    }

    pub fn allocator_mut(&mut self) -> &mut Allocator<K> {
        &mut self.allocator
    }

    pub fn address_of(&self, key: K) -> Option<u32> {
        self.allocator.address_of(key)
    }

    /// Attach contents to an already placed block.
    pub fn define(&mut self, key: K, bytes: Vec<u8>, relocs: Vec<Relocation<K>>) -> Result<()> {
        let placement = self
            .allocator
            .placement(key)
            .ok_or_else(|| LinkError::Unplaced(format!("{:?}", key)))?;
        if !self.defined.insert(key) {
            return Err(LinkError::DuplicateSymbol(format!("{:?}", key)));
        }
        if bytes.len() as u64 > placement.size as u64 {
            return Err(LinkError::SizeMismatch {
                symbol: format!("{:?}", key),
                reserved: placement.size as u64,
                actual: bytes.len() as u64,
            });
        }
        for reloc in &relocs {
            z64_types::codec::take(&bytes, reloc.offset, 4, "relocation")?;
        }
        self.blocks.push(Block { key, bytes, relocs });
        Ok(())
    }

    /// Patch every relocation and assemble the image.
    ///
    /// The image spans up to the highest block end, rounded up to the
    /// configured alignment. Gaps are zero.
    pub fn link(mut self) -> Result<Vec<u8>> {
        for block in &mut self.blocks {
            for reloc in &block.relocs {
                let addr = match reloc.target {
                    None => 0,
                    Some(target) => self.allocator.address_of(target).ok_or_else(|| LinkError::Unresolved {
                        symbol: format!("{:?}", block.key),
                        offset: reloc.offset,
                        target: format!("{:?}", target),
                    })?,
                };
                slot(&mut block.bytes, reloc.offset, 4, "relocation")?.copy_from_slice(&addr.to_be_bytes());
            }
        }

        let total = self.allocator.config().align(self.allocator.end());
        let total = usize::try_from(total).map_err(|_| LinkError::AddressSpace {
            symbol: "image".into(),
            size: total,
        })?;

        let mut placed: Vec<(Placement, Block<K>)> = Vec::with_capacity(self.blocks.len());
        for block in self.blocks {
            let placement = self
                .allocator
                .placement(block.key)
                .ok_or_else(|| LinkError::Unplaced(format!("{:?}", block.key)))?;
            placed.push((placement, block));
        }
        placed.sort_by_key(|(p, b)| (p.addr, b.key));

        let mut image = vec![0u8; total];
        for (placement, block) in &placed {
            let start = placement.addr as usize;
            image[start..start + block.bytes.len()].copy_from_slice(&block.bytes);
        }
        debug!(blocks = placed.len(), size = total, "linked image");
        Ok(image)
    }
}
