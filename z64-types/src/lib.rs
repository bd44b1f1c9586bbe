//! # Z64 Types
//!
//! Typed big-endian binary layouts for Zelda64 audio data.
//!
//! ## Building blocks
//! - Primitives: native integers, floats, `bool`, and 24-bit [`U24`]/[`S24`]
//! - [`Array`] with a type-level length and [`FlexArray`] for trailing members
//! - [`Bitfield`] words with named MSB-first sub-fields
//! - [`Union`] overlays with an active member
//! - [`Pointer`] offsets that dereference relative to the source buffer
//! - [`StructLayout`] for C natural-alignment offsets computed in const context
//! - [`Arena`] storage interning parsed objects by source address
//! - [`StableHasher`] for content identity used by deduplication

pub mod arena;
pub mod array;
pub mod bitfield;
pub mod codec;
pub mod enums;
pub mod error;
pub mod hash;
pub mod layout;
pub mod pointer;
pub mod primitive;
pub mod union;

pub use arena::{Arena, Handle};
pub use array::{Array, FlexArray};
pub use bitfield::{BitField, Bitfield, BitfieldLayout};
pub use codec::{align_to, Codec};
pub use enums::{EnumValue, IntEnum};
pub use error::{Result, Z64Error};
pub use hash::{stable_hash, Digest, StableHasher};
pub use layout::{FieldDecl, FieldReader, FieldWriter, StructLayout};
pub use pointer::{Pointer, STABLE_SENTINEL};
pub use primitive::{Primitive, S24, U24};
pub use union::{Union, UnionLayout, UnionMember};
