//! # Sequence model
//!
//! ```text
//! AudioSequence
//!   sections[i]: Metadata ── channels[0..16] ──> Channel ── layers[0..4] ──> NoteLayer
//!   calls / envelopes / filters / arrays / tables, keyed by address
//! ```
//!
//! Channels and note layers live in arenas and are interned by address, so a
//! stream referenced from two slots is decoded once and shared.

use std::collections::BTreeMap;

use z64_types::{Arena, Array, Handle};

use crate::message::Message;
use crate::section::Section;
use crate::version::AseqVersion;

pub const CHANNEL_SLOTS: usize = 16;
pub const LAYER_SLOTS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub addr: u32,
    pub messages: Vec<Message>,
    pub channels: [Option<Handle<Channel>>; CHANNEL_SLOTS],
}

impl Metadata {
    pub fn new(addr: u32) -> Self {
        Self { addr, messages: Vec::new(), channels: [None; CHANNEL_SLOTS] }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Slot the channel was first loaded into.
    pub index: u8,
    pub addr: u32,
    /// Index of the owning metadata section.
    pub section: usize,
    /// Note mode at the end of the stream.
    pub is_legato: bool,
    pub messages: Vec<Message>,
    pub layers: [Option<Handle<NoteLayer>>; LAYER_SLOTS],
}

impl Channel {
    pub fn new(index: u8, addr: u32, section: usize) -> Self {
        Self { index, addr, section, is_legato: false, messages: Vec::new(), layers: [None; LAYER_SLOTS] }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteLayer {
    pub addr: u32,
    /// Inherited from the loading channel, then toggled by the stream itself.
    pub is_legato: bool,
    pub messages: Vec<Message>,
}

impl NoteLayer {
    pub fn new(addr: u32, is_legato: bool) -> Self {
        Self { addr, is_legato, messages: Vec::new() }
    }
}

/// Fragment whose loads attach to: the stream that reached a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Meta(usize),
    Channel(Handle<Channel>),
    Layer(Handle<NoteLayer>),
}

impl Owner {
    pub fn section(self) -> Section {
        match self {
            Owner::Meta(_) => Section::Meta,
            Owner::Channel(_) => Section::Channel,
            Owner::Layer(_) => Section::Layer,
        }
    }
}

/// Subroutine reached through `call`, decoded against the caller's section.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub addr: u32,
    pub owner: Owner,
    pub is_legato: bool,
    pub messages: Vec<Message>,
}

impl Call {
    pub fn section(&self) -> Section {
        self.owner.section()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvelopePoint {
    pub delay: i16,
    pub arg: i16,
}

/// Envelope points up to, not including, the first negative delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub addr: u32,
    pub points: Vec<EnvelopePoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub addr: u32,
    pub coefficients: Array<i16, 16>,
}

/// Short velocity or gate table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteArray {
    pub addr: u32,
    pub bytes: Array<u8, 16>,
}

/// Dynamic table. Its length is not encoded anywhere, so only the address is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub addr: u32,
}

#[derive(Debug, Clone)]
pub struct AudioSequence {
    pub version: AseqVersion,
    pub sections: Vec<Metadata>,
    pub channels: Arena<Channel>,
    pub layers: Arena<NoteLayer>,
    pub calls: BTreeMap<u32, Call>,
    pub envelopes: BTreeMap<u32, Envelope>,
    pub filters: BTreeMap<u32, Filter>,
    pub arrays: BTreeMap<u32, ByteArray>,
    pub tables: BTreeMap<u32, Table>,
}

impl AudioSequence {
    pub fn new(version: AseqVersion) -> Self {
        Self {
            version,
            sections: Vec::new(),
            channels: Arena::new(),
            layers: Arena::new(),
            calls: BTreeMap::new(),
            envelopes: BTreeMap::new(),
            filters: BTreeMap::new(),
            arrays: BTreeMap::new(),
            tables: BTreeMap::new(),
        }
    }

    pub fn get_section(&self, index: usize) -> Option<&Metadata> {
        self.sections.get(index)
    }

    /// Channel in slot `index` of `section`, if it was loaded.
    pub fn get_channel(&self, section: &Metadata, index: usize) -> Option<&Channel> {
        self.channels.get((*section.channels.get(index)?)?)
    }

    pub fn get_layer(&self, channel: &Channel, index: usize) -> Option<&NoteLayer> {
        self.layers.get((*channel.layers.get(index)?)?)
    }

    /// Number of decoded fragments of every kind.
    pub fn fragment_count(&self) -> usize {
        self.sections.len()
            + self.channels.len()
            + self.layers.len()
            + self.calls.len()
            + self.envelopes.len()
            + self.filters.len()
            + self.arrays.len()
            + self.tables.len()
    }
}
