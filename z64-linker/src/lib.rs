//! # Z64 Linker
//!
//! Packs a graph of typed blocks into one binary image.
//!
//! ## Pipeline
//! 1. Content deduplication ([`Deduplicator`]): blocks with equal stable
//!    content collapse onto one survivor
//! 2. Allocation ([`Allocator`]): fixed blocks are pinned, the rest are
//!    cursor-allocated in the caller's canonical order
//! 3. Linking ([`Linker`]): pointer slots are patched once every address is
//!    final, then blocks are copied into a zeroed image

pub mod allocator;
pub mod config;
pub mod dedup;
pub mod error;
pub mod linker;

pub use allocator::{Allocator, Placement, Symbol};
pub use config::{ConfigError, LinkConfig};
pub use dedup::Deduplicator;
pub use error::{LinkError, Result};
pub use linker::{Linker, Relocation};
