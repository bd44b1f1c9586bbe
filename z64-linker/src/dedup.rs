//! Content deduplication registry.
//!
//! Maps each candidate block to a survivor: the first block registered with
//! the same content digest. Callers register children before parents and
//! fold the children's survivors into the parent digest, so two parents only
//! coalesce when they point at the same survivors.

use std::collections::HashMap;

use tracing::trace;
use z64_types::Digest;

use crate::allocator::Symbol;

#[derive(Debug, Clone)]
pub struct Deduplicator<K> {
    enabled: bool,
    by_digest: HashMap<Digest, K>,
    survivors: HashMap<K, K>,
    unique: Vec<K>,
    coalesced: usize,
}

impl<K: Symbol> Deduplicator<K> {
    /// With `enabled == false` every block survives as itself.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            by_digest: HashMap::new(),
            survivors: HashMap::new(),
            unique: Vec::new(),
            coalesced: 0,
        }
    }

    /// Register `key` and return its survivor. Registering a key again is a no-op.
    pub fn intern(&mut self, key: K, digest: Digest) -> K {
        if let Some(&survivor) = self.survivors.get(&key) {
            return survivor;
        }
        let survivor = if self.enabled {
            *self.by_digest.entry(digest).or_insert(key)
        } else {
            key
        };
        if survivor == key {
            self.unique.push(key);
        } else {
            self.coalesced += 1;
            trace!(duplicate = ?key, survivor = ?survivor, "coalesced block");
        }
        self.survivors.insert(key, survivor);
        survivor
    }

    pub fn survivor(&self, key: K) -> Option<K> {
        self.survivors.get(&key).copied()
    }

    /// Surviving keys in registration order.
    pub fn unique(&self) -> &[K] {
        &self.unique
    }

    /// Number of blocks folded into an earlier survivor.
    pub fn coalesced(&self) -> usize {
        self.coalesced
    }
}
