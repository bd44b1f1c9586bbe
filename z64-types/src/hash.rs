//! Content hashing over stable bytes.

use sha2::{Digest as _, Sha256};

use crate::codec::Codec;
use crate::error::Result;

pub type Digest = [u8; 32];

/// Incremental SHA-256 over stable bytes and identities of child objects.
#[derive(Clone, Default)]
pub struct StableHasher {
    inner: Sha256,
}

impl StableHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value<T: Codec>(mut self, value: &T) -> Result<Self> {
        self.inner.update(value.stable_bytes()?);
        Ok(self)
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.inner.update(bytes);
        self
    }

    /// Mix in an optional child identity; `None` hashes differently from every id.
    pub fn child(mut self, id: Option<u32>) -> Self {
        match id {
            Some(id) => {
                self.inner.update([1u8]);
                self.inner.update(id.to_be_bytes());
            }
            None => self.inner.update([0u8]),
        }
        self
    }

    pub fn finish(self) -> Digest {
        self.inner.finalize().into()
    }
}

pub fn stable_hash<T: Codec>(value: &T) -> Result<Digest> {
    Ok(StableHasher::new().value(value)?.finish())
}
