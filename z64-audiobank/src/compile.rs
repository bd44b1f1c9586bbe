//! # Bank compilation
//!
//! Turns an in-memory [`InstrumentBank`] back into a bank blob and its
//! index entry.
//!
//! 1. Collect every object reachable from the instrument, drum and effect
//!    lists.
//! 2. Deduplicate bottom-up: leaves (loops, books, envelopes) first, then
//!    samples, then instruments and drums. Each digest covers the object's
//!    stable bytes and the survivors of its pointer targets.
//! 3. Pin the header at 0 and the instrument list at 0x08, then the drum
//!    and effect lists on 16-byte boundaries after it.
//! 4. Cursor-allocate survivors in the order instruments, drums, samples,
//!    loops, books, envelopes. Changing this order changes the layout of
//!    the output bank.
//! 5. Link.

use std::collections::HashSet;

use tracing::info;
use z64_linker::{Deduplicator, LinkConfig, Linker, Relocation};
use z64_types::{align_to, Codec, Digest, Handle, Pointer, Primitive, StableHasher};

use crate::bank::{InstrumentBank, INSTRUMENT_LIST_OFFSET};
use crate::envelope::Envelope;
use crate::error::{BankError, Result};
use crate::index::AudiobankIndexEntry;
use crate::instrument::{Drum, Instrument};
use crate::sample::{Sample, TunedSample};
use crate::vadpcm::{VadpcmBook, VadpcmLoop};

/// Block names used while linking a bank. Object variants carry the arena
/// index of the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BankSymbol {
    Header,
    InstrumentList,
    DrumList,
    EffectList,
    Instrument(u32),
    Drum(u32),
    Sample(u32),
    Loop(u32),
    Book(u32),
    Envelope(u32),
}

impl BankSymbol {
    fn index(self) -> Option<u32> {
        match self {
            BankSymbol::Instrument(i)
            | BankSymbol::Drum(i)
            | BankSymbol::Sample(i)
            | BankSymbol::Loop(i)
            | BankSymbol::Book(i)
            | BankSymbol::Envelope(i) => Some(i),
            _ => None,
        }
    }
}

/// Result of compiling a bank.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBank {
    /// Input entry with counts and `bank_size` updated.
    pub index_entry: AudiobankIndexEntry,
    pub data: Vec<u8>,
    /// Objects folded into an identical survivor.
    pub coalesced: usize,
}

// ============================================================================
// Reachability
// ============================================================================

#[derive(Default)]
struct Reachable {
    instruments: Vec<Handle<Instrument>>,
    drums: Vec<Handle<Drum>>,
    samples: Vec<Handle<Sample>>,
    loops: Vec<Handle<VadpcmLoop>>,
    books: Vec<Handle<VadpcmBook>>,
    envelopes: Vec<Handle<Envelope>>,
    seen: HashSet<BankSymbol>,
}

fn dangling(kind: &'static str, index: u32) -> BankError {
    BankError::DanglingHandle { kind, index }
}

impl Reachable {
    fn collect(bank: &InstrumentBank) -> Result<Self> {
        let mut reach = Self::default();
        for &handle in bank.instruments.iter().flatten() {
            reach.instrument(bank, handle)?;
        }
        for &handle in bank.drums.iter().flatten() {
            reach.drum(bank, handle)?;
        }
        for tuned in bank.effects.iter().flatten() {
            reach.sample(bank, &tuned.sample)?;
        }
        Ok(reach)
    }

    fn instrument(&mut self, bank: &InstrumentBank, handle: Handle<Instrument>) -> Result<()> {
        if !self.seen.insert(BankSymbol::Instrument(handle.index())) {
            return Ok(());
        }
        let inst = bank.objects.instruments.get(handle).ok_or(dangling("instrument", handle.index()))?;
        self.instruments.push(handle);
        self.envelope(bank, &inst.envelope)?;
        for tuned in inst.tuned_samples() {
            self.sample(bank, &tuned.sample)?;
        }
        Ok(())
    }

    fn drum(&mut self, bank: &InstrumentBank, handle: Handle<Drum>) -> Result<()> {
        if !self.seen.insert(BankSymbol::Drum(handle.index())) {
            return Ok(());
        }
        let drum = bank.objects.drums.get(handle).ok_or(dangling("drum", handle.index()))?;
        self.drums.push(handle);
        self.sample(bank, &drum.tuned_sample.sample)?;
        self.envelope(bank, &drum.envelope)
    }

    fn sample(&mut self, bank: &InstrumentBank, pointer: &Pointer<Sample>) -> Result<()> {
        let Some(handle) = pointer.target() else {
            return Ok(());
        };
        if !self.seen.insert(BankSymbol::Sample(handle.index())) {
            return Ok(());
        }
        let sample = bank.objects.samples.get(handle).ok_or(dangling("sample", handle.index()))?;
        self.samples.push(handle);
        if let Some(lp) = sample.vadpcm_loop.target() {
            bank.objects.loops.get(lp).ok_or(dangling("loop", lp.index()))?;
            if self.seen.insert(BankSymbol::Loop(lp.index())) {
                self.loops.push(lp);
            }
        }
        if let Some(book) = sample.book.target() {
            bank.objects.books.get(book).ok_or(dangling("book", book.index()))?;
            if self.seen.insert(BankSymbol::Book(book.index())) {
                self.books.push(book);
            }
        }
        Ok(())
    }

    fn envelope(&mut self, bank: &InstrumentBank, pointer: &Pointer<Envelope>) -> Result<()> {
        let Some(handle) = pointer.target() else {
            return Ok(());
        };
        bank.objects.envelopes.get(handle).ok_or(dangling("envelope", handle.index()))?;
        if self.seen.insert(BankSymbol::Envelope(handle.index())) {
            self.envelopes.push(handle);
        }
        Ok(())
    }
}

// ============================================================================
// Deduplication
// ============================================================================

const TAG_INSTRUMENT: u8 = 1;
const TAG_DRUM: u8 = 2;
const TAG_SAMPLE: u8 = 3;
const TAG_LOOP: u8 = 4;
const TAG_BOOK: u8 = 5;
const TAG_ENVELOPE: u8 = 6;

fn digest<T: Codec>(tag: u8, value: &T, children: &[Option<u32>]) -> Result<Digest> {
    let mut hasher = StableHasher::new().bytes(&[tag]).value(value)?;
    for &child in children {
        hasher = hasher.child(child);
    }
    Ok(hasher.finish())
}

struct Survivors(Deduplicator<BankSymbol>);

impl Survivors {
    fn of(&self, symbol: Option<BankSymbol>) -> Option<BankSymbol> {
        symbol.and_then(|s| self.0.survivor(s))
    }

    fn id(&self, symbol: Option<BankSymbol>) -> Option<u32> {
        self.of(symbol).and_then(BankSymbol::index)
    }
}

fn sample_symbol(pointer: &Pointer<Sample>) -> Option<BankSymbol> {
    pointer.target().map(|h| BankSymbol::Sample(h.index()))
}

fn envelope_symbol(pointer: &Pointer<Envelope>) -> Option<BankSymbol> {
    pointer.target().map(|h| BankSymbol::Envelope(h.index()))
}

fn deduplicate(bank: &InstrumentBank, reach: &Reachable, enabled: bool) -> Result<Survivors> {
    let objects = &bank.objects;
    let mut dedup = Survivors(Deduplicator::new(enabled));

    for &h in &reach.loops {
        dedup.0.intern(BankSymbol::Loop(h.index()), digest(TAG_LOOP, &objects.loops[h], &[])?);
    }
    for &h in &reach.books {
        dedup.0.intern(BankSymbol::Book(h.index()), digest(TAG_BOOK, &objects.books[h], &[])?);
    }
    for &h in &reach.envelopes {
        dedup.0.intern(BankSymbol::Envelope(h.index()), digest(TAG_ENVELOPE, &objects.envelopes[h], &[])?);
    }
    for &h in &reach.samples {
        let sample = &objects.samples[h];
        let children = [
            dedup.id(sample.vadpcm_loop.target().map(|t| BankSymbol::Loop(t.index()))),
            dedup.id(sample.book.target().map(|t| BankSymbol::Book(t.index()))),
        ];
        let d = digest(TAG_SAMPLE, sample, &children)?;
        dedup.0.intern(BankSymbol::Sample(h.index()), d);
    }
    for &h in &reach.instruments {
        let inst = &objects.instruments[h];
        let children = [
            dedup.id(envelope_symbol(&inst.envelope)),
            dedup.id(sample_symbol(&inst.low_pitch_tuned_sample.sample)),
            dedup.id(sample_symbol(&inst.normal_pitch_tuned_sample.sample)),
            dedup.id(sample_symbol(&inst.high_pitch_tuned_sample.sample)),
        ];
        let d = digest(TAG_INSTRUMENT, inst, &children)?;
        dedup.0.intern(BankSymbol::Instrument(h.index()), d);
    }
    for &h in &reach.drums {
        let drum = &objects.drums[h];
        let children = [
            dedup.id(sample_symbol(&drum.tuned_sample.sample)),
            dedup.id(envelope_symbol(&drum.envelope)),
        ];
        let d = digest(TAG_DRUM, drum, &children)?;
        dedup.0.intern(BankSymbol::Drum(h.index()), d);
    }
    Ok(dedup)
}

// ============================================================================
// Layout and link
// ============================================================================

fn pointer_list(count: usize, targets: impl Iterator<Item = Option<BankSymbol>>) -> (Vec<u8>, Vec<Relocation<BankSymbol>>) {
    let relocs = targets.enumerate().map(|(i, t)| Relocation::new(i * 4, t)).collect();
    (vec![0; count * 4], relocs)
}

impl InstrumentBank {
    /// Compile with the default link configuration.
    ///
    /// Returns `(index_entry_bytes, bank_bytes)`; with `truncate_index_entry`
    /// only the last 8 bytes of the entry are returned.
    pub fn to_bytes(&self, truncate_index_entry: bool) -> Result<(Vec<u8>, Vec<u8>)> {
        self.to_bytes_with(LinkConfig::DEFAULT, truncate_index_entry)
    }

    pub fn to_bytes_with(&self, config: LinkConfig, truncate_index_entry: bool) -> Result<(Vec<u8>, Vec<u8>)> {
        let compiled = self.compile(config)?;
        let entry = if truncate_index_entry {
            compiled.index_entry.to_truncated_bytes()?
        } else {
            compiled.index_entry.to_bytes()?
        };
        Ok((entry, compiled.data))
    }

    pub fn compile(&self, config: LinkConfig) -> Result<CompiledBank> {
        let reach = Reachable::collect(self)?;
        let dedup = deduplicate(self, &reach, config.deduplicate)?;
        let objects = &self.objects;
        let mut linker = Linker::new(config)?;

        // Fixed lists.
        let num_instruments = self.instruments.len();
        let num_drums = self.drums.len();
        let num_effects = self.effects.len();
        let instrument_list_end = INSTRUMENT_LIST_OFFSET + num_instruments * 4;
        let drum_list = (num_drums > 0).then(|| align_to(instrument_list_end, 0x10));
        let drum_list_end = drum_list.map_or(instrument_list_end, |addr| addr + num_drums * 4);
        let effect_list = (num_effects > 0).then(|| align_to(drum_list_end, 0x10));
        let list_end = effect_list.map_or(drum_list_end, |addr| addr + num_effects * TunedSample::SIZE);

        let alloc = linker.allocator_mut();
        alloc.place(BankSymbol::Header, 0, INSTRUMENT_LIST_OFFSET)?;
        alloc.place(BankSymbol::InstrumentList, INSTRUMENT_LIST_OFFSET as u32, num_instruments * 4)?;
        if let Some(addr) = drum_list {
            alloc.place(BankSymbol::DrumList, addr as u32, num_drums * 4)?;
        }
        if let Some(addr) = effect_list {
            alloc.place(BankSymbol::EffectList, addr as u32, num_effects * TunedSample::SIZE)?;
        }
        alloc.advance_to(config.align(list_end as u64));

        // Survivors in canonical order.
        let survivors = dedup.0.unique().to_vec();
        let rank = |s: &BankSymbol| match s {
            BankSymbol::Instrument(_) => 0,
            BankSymbol::Drum(_) => 1,
            BankSymbol::Sample(_) => 2,
            BankSymbol::Loop(_) => 3,
            BankSymbol::Book(_) => 4,
            _ => 5,
        };
        let mut ordered = survivors.clone();
        ordered.sort_by_key(rank);
        for &symbol in &ordered {
            let size = match symbol {
                BankSymbol::Instrument(_) => Instrument::SIZE,
                BankSymbol::Drum(_) => Drum::SIZE,
                BankSymbol::Sample(_) => Sample::SIZE,
                BankSymbol::Loop(i) => objects.loops[Handle::from_index(i)].size(),
                BankSymbol::Book(i) => objects.books[Handle::from_index(i)].size(),
                BankSymbol::Envelope(i) => objects.envelopes[Handle::from_index(i)].size(),
                _ => 0,
            };
            linker.allocator_mut().reserve(symbol, size)?;
        }

        // Header and lists.
        linker.define(
            BankSymbol::Header,
            vec![0; INSTRUMENT_LIST_OFFSET],
            vec![
                Relocation::new(0, drum_list.map(|_| BankSymbol::DrumList)),
                Relocation::new(4, effect_list.map(|_| BankSymbol::EffectList)),
            ],
        )?;
        let (bytes, relocs) = pointer_list(
            num_instruments,
            self.instruments
                .iter()
                .map(|slot| dedup.of(slot.map(|h| BankSymbol::Instrument(h.index())))),
        );
        linker.define(BankSymbol::InstrumentList, bytes, relocs)?;
        if drum_list.is_some() {
            let (bytes, relocs) = pointer_list(
                num_drums,
                self.drums.iter().map(|slot| dedup.of(slot.map(|h| BankSymbol::Drum(h.index())))),
            );
            linker.define(BankSymbol::DrumList, bytes, relocs)?;
        }
        if effect_list.is_some() {
            let mut bytes = vec![0; num_effects * TunedSample::SIZE];
            let mut relocs = Vec::new();
            for (i, effect) in self.effects.iter().enumerate() {
                if let Some(tuned) = effect {
                    let offset = i * TunedSample::SIZE;
                    tuned.write(&mut bytes[offset..])?;
                    relocs.push(Relocation::new(offset, dedup.of(sample_symbol(&tuned.sample))));
                }
            }
            linker.define(BankSymbol::EffectList, bytes, relocs)?;
        }

        // Objects.
        for &symbol in &survivors {
            let (bytes, relocs) = match symbol {
                BankSymbol::Instrument(i) => {
                    let inst = &objects.instruments[Handle::from_index(i)];
                    let mut relocs = vec![Relocation::new(Instrument::ENVELOPE_OFFSET, dedup.of(envelope_symbol(&inst.envelope)))];
                    for (offset, tuned) in Instrument::SAMPLE_OFFSETS.into_iter().zip(inst.tuned_samples()) {
                        relocs.push(Relocation::new(offset, dedup.of(sample_symbol(&tuned.sample))));
                    }
                    (inst.to_bytes()?, relocs)
                }
                BankSymbol::Drum(i) => {
                    let drum = &objects.drums[Handle::from_index(i)];
                    let relocs = vec![
                        Relocation::new(Drum::SAMPLE_OFFSET, dedup.of(sample_symbol(&drum.tuned_sample.sample))),
                        Relocation::new(Drum::ENVELOPE_OFFSET, dedup.of(envelope_symbol(&drum.envelope))),
                    ];
                    (drum.to_bytes()?, relocs)
                }
                BankSymbol::Sample(i) => {
                    let sample = &objects.samples[Handle::from_index(i)];
                    let lp = sample.vadpcm_loop.target().map(|t| BankSymbol::Loop(t.index()));
                    let book = sample.book.target().map(|t| BankSymbol::Book(t.index()));
                    let relocs = vec![
                        Relocation::new(Sample::LOOP_OFFSET, dedup.of(lp)),
                        Relocation::new(Sample::BOOK_OFFSET, dedup.of(book)),
                    ];
                    (sample.to_bytes()?, relocs)
                }
                BankSymbol::Loop(i) => (objects.loops[Handle::from_index(i)].to_bytes()?, Vec::new()),
                BankSymbol::Book(i) => (objects.books[Handle::from_index(i)].to_bytes()?, Vec::new()),
                BankSymbol::Envelope(i) => (objects.envelopes[Handle::from_index(i)].to_bytes()?, Vec::new()),
                _ => continue,
            };
            linker.define(symbol, bytes, relocs)?;
        }

        let data = linker.link()?;

        let mut index_entry = self.index_entry;
        index_entry.num_instruments = u8::checked_from(num_instruments as i128)?;
        index_entry.num_drums = u8::checked_from(num_drums as i128)?;
        index_entry.num_effects = i16::checked_from(num_effects as i128)?;
        index_entry.bank_size = u32::checked_from(data.len() as i128)?;

        info!(
            size = data.len(),
            instruments = reach.instruments.len(),
            drums = reach.drums.len(),
            samples = reach.samples.len(),
            envelopes = reach.envelopes.len(),
            coalesced = dedup.0.coalesced(),
            "compiled instrument bank"
        );
        Ok(CompiledBank { index_entry, data, coalesced: dedup.0.coalesced() })
    }
}
