//! # Z64 Audiobank
//!
//! Model of the Zelda64 instrument bank format.
//!
//! ## Layout of a bank
//! ```text
//! 0x00  u32          drum list offset
//! 0x04  u32          effect list offset
//! 0x08  u32[n]       instrument pointers
//! ....  u32[n]       drum pointers
//! ....  TunedSample  effects, stored inline
//! ....               instruments, drums, samples, loops, books, envelopes
//! ```
//!
//! [`InstrumentBank::parse`] decodes a bank into arenas with every pointer
//! bound to its target. [`InstrumentBank::to_bytes`] deduplicates, lays out
//! and links it back into a blob plus index entry.

pub mod audiobank;
pub mod bank;
pub mod compile;
pub mod enums;
pub mod envelope;
pub mod error;
pub mod index;
pub mod instrument;
pub mod sample;
pub mod vadpcm;

pub use audiobank::Audiobank;
pub use bank::{BankObjects, InstrumentBank, INSTRUMENT_LIST_OFFSET};
pub use compile::{BankSymbol, CompiledBank};
pub use enums::{AdsrOpcode, AudioCacheLoadType, AudioSampleCodec, AudioStorageMedium, VadpcmLoopCount};
pub use envelope::{Envelope, EnvelopePoint};
pub use error::{BankError, Result};
pub use index::{AudiobankIndex, AudiobankIndexEntry, AudiotableIndexEntry};
pub use instrument::{Drum, Instrument};
pub use sample::{Sample, SampleFlags, SampleFlagsLayout, TunedSample};
pub use vadpcm::{VadpcmBook, VadpcmBookHeader, VadpcmLoop, VadpcmLoopHeader};
