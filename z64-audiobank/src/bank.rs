//! # Instrument Bank
//!
//! A bank blob starts with two pointers, to the drum list and the effect
//! list, followed by the instrument pointer list at 0x08. Drum and
//! instrument lists hold pointers; the effect list holds inline
//! [`TunedSample`] records.
//!
//! Parsing decodes every reachable object exactly once into per-type
//! arenas and binds each pointer to the handle of its target, so shared
//! samples and envelopes stay shared in memory.

use tracing::debug;
use z64_types::{Arena, Codec, Handle, Pointer, Result as LayoutResult, Z64Error};

use crate::envelope::Envelope;
use crate::error::Result;
use crate::index::AudiobankIndexEntry;
use crate::instrument::{Drum, Instrument};
use crate::sample::{Sample, TunedSample};
use crate::vadpcm::{VadpcmBook, VadpcmLoop};

/// Offset of the instrument pointer list.
pub const INSTRUMENT_LIST_OFFSET: usize = 0x08;

/// Every object owned by a bank, one arena per type.
#[derive(Debug, Clone, Default)]
pub struct BankObjects {
    pub instruments: Arena<Instrument>,
    pub drums: Arena<Drum>,
    pub samples: Arena<Sample>,
    pub loops: Arena<VadpcmLoop>,
    pub books: Arena<VadpcmBook>,
    pub envelopes: Arena<Envelope>,
}

impl BankObjects {
    fn load_envelope(&mut self, blob: &[u8], pointer: &mut Pointer<Envelope>) -> LayoutResult<()> {
        let handle = self.envelopes.load(blob, pointer.addr(), Envelope::read)?;
        pointer.bind(handle);
        Ok(())
    }

    fn load_sample(&mut self, blob: &[u8], pointer: &mut Pointer<Sample>) -> LayoutResult<()> {
        let before = self.samples.len();
        let handle = self.samples.load(blob, pointer.addr(), Sample::read)?;
        if let Some(handle) = handle.filter(|_| self.samples.len() > before) {
            let mut sample = self.samples[handle].clone();
            let vadpcm_loop = self.loops.load(blob, sample.vadpcm_loop.addr(), VadpcmLoop::read)?;
            let book = self.books.load(blob, sample.book.addr(), VadpcmBook::read)?;
            sample.vadpcm_loop.bind(vadpcm_loop);
            sample.book.bind(book);
            self.samples[handle] = sample;
        }
        pointer.bind(handle);
        Ok(())
    }

    fn load_tuned_sample(&mut self, blob: &[u8], tuned: &mut TunedSample) -> LayoutResult<()> {
        self.load_sample(blob, &mut tuned.sample)
    }

    fn load_instrument(&mut self, blob: &[u8], addr: u32) -> LayoutResult<Option<Handle<Instrument>>> {
        let before = self.instruments.len();
        let handle = self.instruments.load(blob, addr, Instrument::read)?;
        if let Some(handle) = handle.filter(|_| self.instruments.len() > before) {
            let mut inst = self.instruments[handle];
            self.load_envelope(blob, &mut inst.envelope)?;
            for tuned in inst.tuned_samples_mut() {
                self.load_tuned_sample(blob, tuned)?;
            }
            self.instruments[handle] = inst;
        }
        Ok(handle)
    }

    fn load_drum(&mut self, blob: &[u8], addr: u32) -> LayoutResult<Option<Handle<Drum>>> {
        let before = self.drums.len();
        let handle = self.drums.load(blob, addr, Drum::read)?;
        if let Some(handle) = handle.filter(|_| self.drums.len() > before) {
            let mut drum = self.drums[handle];
            self.load_tuned_sample(blob, &mut drum.tuned_sample)?;
            self.load_envelope(blob, &mut drum.envelope)?;
            self.drums[handle] = drum;
        }
        Ok(handle)
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentBank {
    pub index_entry: AudiobankIndexEntry,
    pub instruments: Vec<Option<Handle<Instrument>>>,
    pub drums: Vec<Option<Handle<Drum>>>,
    pub effects: Vec<Option<TunedSample>>,
    pub objects: BankObjects,
}

/// Read `count` pointer slots starting at `list`; a zero list address means
/// the list is absent and every slot is null.
fn read_slots(blob: &[u8], list: u32, count: usize) -> LayoutResult<Vec<u32>> {
    if list == 0 {
        return Ok(vec![0; count]);
    }
    (0..count).map(|i| u32::read(blob, list as usize + i * 4)).collect()
}

impl InstrumentBank {
    /// Bank with no instruments, drums or effects.
    pub fn new(index_entry: AudiobankIndexEntry) -> Self {
        Self {
            index_entry,
            instruments: Vec::new(),
            drums: Vec::new(),
            effects: Vec::new(),
            objects: BankObjects::default(),
        }
    }

    /// Parse with an index entry given as raw bytes, full or truncated.
    pub fn parse_bytes(index_entry: &[u8], blob: &[u8]) -> Result<Self> {
        Self::parse(AudiobankIndexEntry::parse(index_entry)?, blob)
    }

    pub fn parse(index_entry: AudiobankIndexEntry, blob: &[u8]) -> Result<Self> {
        let drum_list = u32::read(blob, 0)?;
        let effect_list = u32::read(blob, 4)?;
        let num_effects = usize::try_from(index_entry.num_effects).map_err(|_| Z64Error::OutOfRange {
            type_name: "num_effects",
            value: index_entry.num_effects as i128,
        })?;

        let mut objects = BankObjects::default();

        let mut drums = Vec::with_capacity(index_entry.num_drums as usize);
        for addr in read_slots(blob, drum_list, index_entry.num_drums as usize)? {
            drums.push(objects.load_drum(blob, addr)?);
        }

        let mut effects = Vec::with_capacity(num_effects);
        for i in 0..num_effects {
            if effect_list == 0 {
                effects.push(None);
                continue;
            }
            let mut tuned = TunedSample::read(blob, effect_list as usize + i * TunedSample::SIZE)?;
            if tuned.is_empty() {
                effects.push(None);
            } else {
                objects.load_tuned_sample(blob, &mut tuned)?;
                effects.push(Some(tuned));
            }
        }

        let mut instruments = Vec::with_capacity(index_entry.num_instruments as usize);
        let list = INSTRUMENT_LIST_OFFSET as u32;
        for addr in read_slots(blob, list, index_entry.num_instruments as usize)? {
            instruments.push(objects.load_instrument(blob, addr)?);
        }

        debug!(
            instruments = objects.instruments.len(),
            drums = objects.drums.len(),
            samples = objects.samples.len(),
            envelopes = objects.envelopes.len(),
            "parsed instrument bank"
        );
        Ok(Self { index_entry, instruments, drums, effects, objects })
    }

    pub fn instrument(&self, index: usize) -> Option<&Instrument> {
        let handle = (*self.instruments.get(index)?)?;
        self.objects.instruments.get(handle)
    }

    pub fn drum(&self, index: usize) -> Option<&Drum> {
        let handle = (*self.drums.get(index)?)?;
        self.objects.drums.get(handle)
    }

    pub fn effect(&self, index: usize) -> Option<&TunedSample> {
        self.effects.get(index)?.as_ref()
    }

    /// Sample a tuned sample refers to.
    pub fn sample(&self, tuned: &TunedSample) -> Option<&Sample> {
        self.objects.samples.follow(&tuned.sample)
    }

    pub fn envelope(&self, pointer: &Pointer<Envelope>) -> Option<&Envelope> {
        self.objects.envelopes.follow(pointer)
    }

    pub fn add_instrument(&mut self, instrument: Instrument) -> Handle<Instrument> {
        let handle = self.objects.instruments.insert(instrument);
        self.instruments.push(Some(handle));
        handle
    }

    pub fn add_drum(&mut self, drum: Drum) -> Handle<Drum> {
        let handle = self.objects.drums.insert(drum);
        self.drums.push(Some(handle));
        handle
    }

    pub fn add_effect(&mut self, effect: Option<TunedSample>) {
        self.effects.push(effect);
    }

    pub fn add_sample(&mut self, sample: Sample) -> Pointer<Sample> {
        Pointer::to(self.objects.samples.insert(sample))
    }

    pub fn add_envelope(&mut self, envelope: Envelope) -> Pointer<Envelope> {
        Pointer::to(self.objects.envelopes.insert(envelope))
    }

    pub fn add_loop(&mut self, vadpcm_loop: VadpcmLoop) -> Pointer<VadpcmLoop> {
        Pointer::to(self.objects.loops.insert(vadpcm_loop))
    }

    pub fn add_book(&mut self, book: VadpcmBook) -> Pointer<VadpcmBook> {
        Pointer::to(self.objects.books.insert(book))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::AdsrOpcode;
    use crate::envelope::EnvelopePoint;

    fn entry(num_instruments: u8, num_drums: u8, num_effects: i16) -> AudiobankIndexEntry {
        AudiobankIndexEntry { num_instruments, num_drums, num_effects, ..AudiobankIndexEntry::default() }
    }

    fn put_u32(blob: &mut [u8], offset: usize, value: u32) {
        blob[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Two instruments sharing one sample and one envelope, one drum, one effect.
    fn shared_blob() -> Vec<u8> {
        let mut blob = vec![0u8; 0xC0];
        put_u32(&mut blob, 0x00, 0x10); // drum list
        put_u32(&mut blob, 0x04, 0x18); // effect list
        put_u32(&mut blob, 0x08, 0x20); // instrument 0
        put_u32(&mut blob, 0x0C, 0x40); // instrument 1
        put_u32(&mut blob, 0x10, 0x60); // drum 0
        put_u32(&mut blob, 0x18, 0x80); // effect sample
        blob[0x1C..0x20].copy_from_slice(&1.0f32.to_be_bytes());
        for inst in [0x20, 0x40] {
            put_u32(&mut blob, inst + 4, 0xA0);
            put_u32(&mut blob, inst + 16, 0x80);
            blob[inst + 20..inst + 24].copy_from_slice(&1.0f32.to_be_bytes());
        }
        put_u32(&mut blob, 0x60 + 4, 0x80);
        put_u32(&mut blob, 0x60 + 12, 0xA0);
        put_u32(&mut blob, 0x80, 0x0000_0100); // sample flags: size 0x100
        blob[0xA0..0xA8].copy_from_slice(&[0x00, 0x01, 0x7F, 0xFF, 0xFF, 0xFF, 0x00, 0x00]);
        blob
    }

    #[test]
    fn test_parse_interns_shared_objects() {
        let bank = InstrumentBank::parse(entry(2, 1, 1), &shared_blob()).unwrap();
        assert_eq!(bank.instruments.len(), 2);
        assert_eq!(bank.objects.instruments.len(), 2);
        assert_eq!(bank.objects.samples.len(), 1);
        assert_eq!(bank.objects.envelopes.len(), 1);

        let a = bank.instrument(0).unwrap();
        let b = bank.instrument(1).unwrap();
        assert_eq!(a.envelope.target(), b.envelope.target());
        assert_eq!(a.normal_pitch_tuned_sample.sample.target(), bank.drum(0).unwrap().tuned_sample.sample.target());

        let effect = bank.effect(0).unwrap();
        assert_eq!(bank.sample(effect).unwrap().data_size().unwrap(), 0x100);
        let env = bank.envelope(&a.envelope).unwrap();
        assert_eq!(env.len(), 2);
        assert!(env.points.at(1).unwrap().is_opcode());
    }

    #[test]
    fn test_null_slots() {
        let mut blob = shared_blob();
        put_u32(&mut blob, 0x0C, 0);
        blob[0x18..0x20].fill(0);
        let bank = InstrumentBank::parse(entry(2, 1, 1), &blob).unwrap();
        assert!(bank.instrument(1).is_none());
        assert_eq!(bank.instruments[1], None);
        assert_eq!(bank.effects, vec![None]);
    }

    #[test]
    fn test_out_of_range_pointer_is_null() {
        let mut blob = shared_blob();
        put_u32(&mut blob, 0x0C, 0x1000);
        let bank = InstrumentBank::parse(entry(2, 1, 1), &blob).unwrap();
        assert!(bank.instruments[1].is_none());
    }

    #[test]
    fn test_truncated_object_is_an_error() {
        let blob = shared_blob();
        let err = InstrumentBank::parse(entry(2, 1, 1), &blob[..0x88]).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_parse_bytes_truncated_entry() {
        let bytes = entry(2, 1, 1).to_truncated_bytes().unwrap();
        let bank = InstrumentBank::parse_bytes(&bytes, &shared_blob()).unwrap();
        assert_eq!(bank.index_entry.num_instruments, 2);
        assert_eq!(bank.index_entry.rom_addr, 0);
    }

    #[test]
    fn test_build_in_memory() {
        let mut bank = InstrumentBank::new(AudiobankIndexEntry::default());
        let env = bank.add_envelope(Envelope::new(vec![EnvelopePoint::op(AdsrOpcode::Hang, 0)]));
        let handle = bank.add_instrument(Instrument { envelope: env, ..Instrument::default() });
        assert_eq!(bank.instruments, vec![Some(handle)]);
        assert_eq!(bank.envelope(&bank.instrument(0).unwrap().envelope).unwrap().len(), 1);
    }
}
