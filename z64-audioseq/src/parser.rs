//! # Worklist parser
//!
//! Breadth-first discovery of every fragment reachable from the metadata
//! stream at address 0. Edges are the address operands of load, call and
//! data instructions. A visited set keyed by address makes shared and cyclic
//! references terminate; per-slot checks keep a channel's layer slots and a
//! section's channel slots idempotent.
//!
//! ## Recovery
//! - Opcode missing from the table: skip one byte and retry.
//! - Address operand past the end of the buffer: not followed.
//!
//! Both are logged and counted in [`ParseStats`]. Arguments or data
//! fragments running off the end of the buffer are structural errors and
//! abort the parse.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};
use z64_types::{Array, Codec, Handle};

use crate::config::ParserConfig;
use crate::error::{Result, SequenceError};
use crate::message::Message;
use crate::opcode::Effect;
use crate::registry::Registry;
use crate::sequence::{
    AudioSequence, ByteArray, Call, Channel, Envelope, EnvelopePoint, Filter, Metadata, NoteLayer, Owner, Table,
    CHANNEL_SLOTS, LAYER_SLOTS,
};

/// Counters for the recoverable events of one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Fragments popped off the queue, revisits included.
    pub dequeued: usize,
    /// Pops skipped because the address was already decoded.
    pub revisits: usize,
    pub unknown_opcodes: usize,
    /// Address operands past the end of the buffer.
    pub unresolved: usize,
}

impl fmt::Display for ParseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dequeued, {} revisits, {} unknown opcodes, {} unresolved",
            self.dequeued, self.revisits, self.unknown_opcodes, self.unresolved
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Job {
    Metadata(usize),
    Channel(Handle<Channel>),
    Layer(Handle<NoteLayer>),
    Call { owner: Owner, is_legato: bool },
    Envelope,
    Filter,
    Array,
    Table,
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Metadata(_) => "meta",
            Job::Channel(_) => "channel",
            Job::Layer(_) => "layer",
            Job::Call { .. } => "call",
            Job::Envelope => "envelope",
            Job::Filter => "filter",
            Job::Array => "array",
            Job::Table => "table",
        }
    }
}

pub struct Parser<'a> {
    data: &'a [u8],
    registry: &'a Registry,
    config: ParserConfig,
    sequence: AudioSequence,
    queue: VecDeque<(u32, Job)>,
    visited: HashSet<u32>,
    stats: ParseStats,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8], registry: &'a Registry, config: ParserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            data,
            registry,
            config,
            sequence: AudioSequence::new(config.version),
            queue: VecDeque::new(),
            visited: HashSet::new(),
            stats: ParseStats::default(),
        })
    }

    pub fn parse(mut self) -> Result<(AudioSequence, ParseStats)> {
        self.sequence.sections.push(Metadata::new(0));
        self.queue.push_back((0, Job::Metadata(0)));

        while let Some((addr, job)) = self.queue.pop_front() {
            self.stats.dequeued += 1;
            trace!(addr, kind = job.name(), "dequeued fragment");
            if !self.visited.insert(addr) {
                self.stats.revisits += 1;
                continue;
            }
            if self.visited.len() > self.config.max_fragments {
                return Err(SequenceError::FragmentLimit { limit: self.config.max_fragments });
            }
            self.decode(addr, job)?;
        }

        debug!(
            size = self.data.len(),
            fragments = self.sequence.fragment_count(),
            stats = %self.stats,
            "parsed sequence"
        );
        Ok((self.sequence, self.stats))
    }

    fn enqueue(&mut self, addr: u32, job: Job) {
        self.queue.push_back((addr, job));
    }

    fn decode(&mut self, addr: u32, job: Job) -> Result<()> {
        match job {
            Job::Metadata(index) => {
                let (messages, _) = self.decode_stream(addr, Owner::Meta(index), false)?;
                if let Some(meta) = self.sequence.sections.get_mut(index) {
                    meta.messages = messages;
                }
            }
            Job::Channel(handle) => {
                let legato = self.sequence.channels.get(handle).map_or(false, |c| c.is_legato);
                let (messages, legato) = self.decode_stream(addr, Owner::Channel(handle), legato)?;
                if let Some(channel) = self.sequence.channels.get_mut(handle) {
                    channel.messages = messages;
                    channel.is_legato = legato;
                }
            }
            Job::Layer(handle) => {
                let legato = self.sequence.layers.get(handle).map_or(false, |l| l.is_legato);
                let (messages, legato) = self.decode_stream(addr, Owner::Layer(handle), legato)?;
                if let Some(layer) = self.sequence.layers.get_mut(handle) {
                    layer.messages = messages;
                    layer.is_legato = legato;
                }
            }
            Job::Call { owner, is_legato } => {
                let (messages, is_legato) = self.decode_stream(addr, owner, is_legato)?;
                self.sequence.calls.insert(addr, Call { addr, owner, is_legato, messages });
            }
            Job::Envelope => {
                let points = read_envelope(self.data, addr as usize)?;
                self.sequence.envelopes.insert(addr, Envelope { addr, points });
            }
            Job::Filter => {
                let coefficients = Array::<i16, 16>::read(self.data, addr as usize)?;
                self.sequence.filters.insert(addr, Filter { addr, coefficients });
            }
            Job::Array => {
                let bytes = Array::<u8, 16>::read(self.data, addr as usize)?;
                self.sequence.arrays.insert(addr, ByteArray { addr, bytes });
            }
            Job::Table => {
                self.sequence.tables.insert(addr, Table { addr });
            }
        }
        Ok(())
    }

    /// Decode instructions from `addr` until a terminal one or the end of the buffer.
    ///
    /// Returns the messages and the note mode at the end of the stream.
    fn decode_stream(&mut self, addr: u32, owner: Owner, mut legato: bool) -> Result<(Vec<Message>, bool)> {
        let section = owner.section();
        let version = self.config.version;
        let mut messages = Vec::new();
        let mut offset = addr as usize;

        while let Some(&opcode) = self.data.get(offset) {
            let Some(spec) = self.registry.lookup(section, opcode, version, legato) else {
                debug!(offset, opcode, %section, %version, "unknown opcode, skipping one byte");
                self.stats.unknown_opcodes += 1;
                offset += 1;
                continue;
            };
            let message = Message::decode(self.data, offset, spec)?;

            match message.effect() {
                Effect::Legato => legato = true,
                Effect::Staccato => legato = false,
                _ => {}
            }
            offset += message.size();
            self.follow(&message, owner, legato);

            let terminal = message.is_terminal();
            messages.push(message);
            if terminal {
                break;
            }
        }
        Ok((messages, legato))
    }

    fn follow(&mut self, message: &Message, owner: Owner, legato: bool) {
        let Some(target) = message.target() else {
            return;
        };
        if target as usize >= self.data.len() {
            debug!(addr = message.addr, target, name = message.name(), "target past end of sequence, not followed");
            self.stats.unresolved += 1;
            return;
        }
        match message.effect() {
            Effect::LoadChannel => self.load_channel(owner, message.argbit(), target),
            Effect::LoadLayer => self.load_layer(owner, message.argbit(), target, legato),
            Effect::Call => self.enqueue(target, Job::Call { owner, is_legato: legato }),
            Effect::Envelope => self.enqueue(target, Job::Envelope),
            Effect::Filter => self.enqueue(target, Job::Filter),
            Effect::Array => self.enqueue(target, Job::Array),
            Effect::Table => self.enqueue(target, Job::Table),
            Effect::None | Effect::Branch { .. } | Effect::Legato | Effect::Staccato => {}
        }
    }

    fn load_channel(&mut self, owner: Owner, index: u8, target: u32) {
        let section = match owner {
            Owner::Meta(section) => section,
            Owner::Channel(handle) => match self.sequence.channels.get(handle) {
                Some(channel) => channel.section,
                None => return,
            },
            Owner::Layer(_) => return,
        };
        let slot = index as usize;
        let occupied = self
            .sequence
            .sections
            .get(section)
            .map_or(true, |meta| slot >= CHANNEL_SLOTS || meta.channels[slot].is_some());
        if occupied {
            return;
        }

        let (handle, created) = self.sequence.channels.intern(target, || Channel::new(index, target, section));
        if let Some(meta) = self.sequence.sections.get_mut(section) {
            meta.channels[slot] = Some(handle);
        }
        if created {
            self.enqueue(target, Job::Channel(handle));
        }
    }

    fn load_layer(&mut self, owner: Owner, index: u8, target: u32, legato: bool) {
        let Owner::Channel(channel) = owner else {
            return;
        };
        let slot = index as usize;
        if slot >= LAYER_SLOTS {
            debug!(target, index, "note layer index out of range, ignored");
            return;
        }
        let occupied = self.sequence.channels.get(channel).map_or(true, |c| c.layers[slot].is_some());
        if occupied {
            return;
        }

        let (handle, created) = self.sequence.layers.intern(target, || NoteLayer::new(target, legato));
        if let Some(c) = self.sequence.channels.get_mut(channel) {
            c.layers[slot] = Some(handle);
        }
        if created {
            self.enqueue(target, Job::Layer(handle));
        }
    }
}

fn read_envelope(data: &[u8], offset: usize) -> z64_types::Result<Vec<EnvelopePoint>> {
    let mut points = Vec::new();
    let mut offset = offset;
    loop {
        let delay = i16::read(data, offset)?;
        if delay < 0 {
            return Ok(points);
        }
        let arg = i16::read(data, offset + 2)?;
        points.push(EnvelopePoint { delay, arg });
        offset += 4;
    }
}

/// Parse `data` against the built-in opcode table.
pub fn parse(data: &[u8], config: ParserConfig) -> Result<AudioSequence> {
    parse_with_stats(data, config).map(|(sequence, _)| sequence)
}

pub fn parse_with_stats(data: &[u8], config: ParserConfig) -> Result<(AudioSequence, ParseStats)> {
    Parser::new(data, Registry::standard(), config)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::AseqVersion;
    use z64_types::Z64Error;

    fn run(data: &[u8]) -> (AudioSequence, ParseStats) {
        parse_with_stats(data, ParserConfig::DEFAULT).unwrap()
    }

    #[test]
    fn test_empty_buffer() {
        let (seq, stats) = run(&[]);
        assert_eq!(seq.sections.len(), 1);
        assert!(seq.sections[0].messages.is_empty());
        assert_eq!(stats.dequeued, 1);
    }

    #[test]
    fn test_load_channel_and_layer() {
        // meta: ldchan 0 -> 0x04, end
        // chan: ldlayer 0 -> 0x08, end
        // layer: ldelay 16, end
        let data = [
            0x90, 0x00, 0x04, 0xFF, //
            0x88, 0x00, 0x08, 0xFF, //
            0xC0, 0x10, 0xFF,
        ];
        let (seq, stats) = run(&data);
        assert_eq!(stats.dequeued, 3);
        let meta = seq.get_section(0).unwrap();
        let channel = seq.get_channel(meta, 0).unwrap();
        assert_eq!(channel.addr, 4);
        let layer = seq.get_layer(channel, 0).unwrap();
        assert_eq!(layer.addr, 8);
        let names: Vec<_> = layer.messages.iter().map(Message::name).collect();
        assert_eq!(names, ["ldelay", "end"]);
    }

    #[test]
    fn test_unknown_opcode_skips_one_byte() {
        // 0x10 is not a metadata opcode.
        let (seq, stats) = run(&[0x10, 0x10, 0xFF]);
        assert_eq!(stats.unknown_opcodes, 2);
        assert_eq!(seq.sections[0].messages.len(), 1);
        assert_eq!(seq.sections[0].messages[0].addr, 2);
    }

    #[test]
    fn test_unresolved_target_not_followed() {
        let (seq, stats) = run(&[0x90, 0x40, 0x00, 0xFF]);
        assert_eq!(stats.unresolved, 1);
        assert_eq!(stats.dequeued, 1);
        assert!(seq.sections[0].channels.iter().all(Option::is_none));
    }

    #[test]
    fn test_truncated_instruction_is_error() {
        let err = parse(&[0xDB, 0x40, 0x90, 0x00], ParserConfig::DEFAULT).unwrap_err();
        assert!(matches!(err, SequenceError::Layout(Z64Error::Truncated { .. })));
        assert!(err.is_structural());
    }

    #[test]
    fn test_truncated_call_in_channel_is_error() {
        // The channel's call operand is cut to one byte.
        let err = parse(&[0x90, 0x00, 0x03, 0xFC, 0x00], ParserConfig::DEFAULT).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_decoding_continues_past_jump() {
        let (seq, stats) = run(&[0xFB, 0x00, 0x03, 0xFE, 0xFF]);
        let names: Vec<_> = seq.sections[0].messages.iter().map(Message::name).collect();
        assert_eq!(names, ["jump", "delay1", "end"]);
        assert_eq!(stats.dequeued, 1);
    }

    #[test]
    fn test_decoding_continues_past_relative_jump() {
        let (seq, _) = run(&[0xF4, 0x02, 0xFE, 0xFF]);
        let names: Vec<_> = seq.sections[0].messages.iter().map(Message::name).collect();
        assert_eq!(names, ["rjump", "delay1", "end"]);
    }

    #[test]
    fn test_first_load_wins_slot() {
        // Two loads into channel slot 1; only the first is taken.
        let data = [0x91, 0x00, 0x07, 0x91, 0x00, 0x08, 0xFF, 0xFF, 0xFF];
        let (seq, stats) = run(&data);
        let meta = seq.get_section(0).unwrap();
        assert_eq!(seq.get_channel(meta, 1).unwrap().addr, 7);
        assert_eq!(seq.channels.len(), 1);
        assert_eq!(stats.dequeued, 2);
    }

    #[test]
    fn test_layer_index_out_of_range_ignored() {
        let data = [0x90, 0x00, 0x04, 0xFF, 0x8C, 0x00, 0x08, 0xFF, 0xFF];
        let (seq, _) = run(&data);
        let meta = seq.get_section(0).unwrap();
        let channel = seq.get_channel(meta, 0).unwrap();
        assert!(channel.layers.iter().all(Option::is_none));
        assert_eq!(channel.messages[0].name(), "ldlayer");
        assert!(seq.layers.is_empty());
    }

    #[test]
    fn test_fragment_limit() {
        let config = ParserConfig::new(AseqVersion::Oot, 1).unwrap();
        let err = parse(&[0x90, 0x00, 0x04, 0xFF, 0xFF], config).unwrap_err();
        assert_eq!(err, SequenceError::FragmentLimit { limit: 1 });
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ParserConfig { max_fragments: 0, ..ParserConfig::DEFAULT };
        assert!(matches!(parse(&[0xFF], config), Err(SequenceError::Config(_))));
    }

    #[test]
    fn test_envelope_stops_at_negative_delay() {
        let data = [0x00, 0x0A, 0x7F, 0x00, 0x00, 0x14, 0x40, 0x00, 0xFF, 0xFF, 0x00, 0x00];
        let points = read_envelope(&data, 0).unwrap();
        assert_eq!(points, vec![EnvelopePoint { delay: 10, arg: 0x7F00 }, EnvelopePoint { delay: 20, arg: 0x4000 }]);
        assert!(read_envelope(&data[..8], 0).is_err());
    }
}
