//! # Z64 Audioseq
//!
//! Static decoding of Zelda64 audio sequence byte-code.
//!
//! A sequence is a graph of instruction streams: the metadata stream at
//! address 0 loads up to 16 channels, each channel loads up to 4 note layers,
//! and any stream may call subroutines or point at envelope, filter, array
//! and table data. [`Parser`] walks that graph breadth-first from a
//! [`Registry`] of opcode shapes and returns an [`AudioSequence`].
//!
//! ## Example
//!
//! ```rust
//! use z64_audioseq::{parse, ParserConfig};
//!
//! // ldchan 0 -> 0x0003; end | end
//! let seq = parse(&[0x90, 0x00, 0x03, 0xFF], ParserConfig::DEFAULT).unwrap();
//! let meta = seq.get_section(0).unwrap();
//! let channel = seq.get_channel(meta, 0).unwrap();
//! assert_eq!(channel.addr, 3);
//! assert_eq!(channel.messages[0].name(), "end");
//! ```

pub mod args;
pub mod config;
pub mod error;
pub mod formatter;
pub mod message;
pub mod opcode;
pub mod parser;
pub mod registry;
pub mod section;
pub mod sequence;
pub mod version;

pub use args::{ArgShape, ArgValue, VarInt};
pub use config::{ConfigError, ParserConfig};
pub use error::{Result, SequenceError};
pub use formatter::{format, format_message, Listing};
pub use message::Message;
pub use opcode::{Effect, NoteMode, OpcodeSpec, OPCODES};
pub use parser::{parse, parse_with_stats, ParseStats, Parser};
pub use registry::Registry;
pub use section::{Section, SectionSet};
pub use sequence::{
    AudioSequence, ByteArray, Call, Channel, Envelope, EnvelopePoint, Filter, Metadata, NoteLayer, Owner, Table,
};
pub use version::{AseqVersion, Compat};
