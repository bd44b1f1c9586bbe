//! Instruments and drums.

use z64_types::{Codec, FieldDecl, Pointer, Result, StructLayout};

use crate::envelope::Envelope;
use crate::sample::TunedSample;

// ============================================================================
// Instrument
// ============================================================================

/// A melodic instrument. Notes below `low_key_region` play the low sample,
/// notes above `high_key_region` the high one, everything else the normal
/// sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Instrument {
    pub is_relocated: bool,
    pub low_key_region: u8,
    pub high_key_region: u8,
    pub decay_index: u8,
    pub envelope: Pointer<Envelope>,
    pub low_pitch_tuned_sample: TunedSample,
    pub normal_pitch_tuned_sample: TunedSample,
    pub high_pitch_tuned_sample: TunedSample,
}

impl Instrument {
    pub const LAYOUT: StructLayout<8> = StructLayout::new(
        "Instrument",
        [
            FieldDecl::of::<bool>("is_relocated"),
            FieldDecl::of::<u8>("low_key_region"),
            FieldDecl::of::<u8>("high_key_region"),
            FieldDecl::of::<u8>("decay_index"),
            FieldDecl::of::<Pointer<Envelope>>("envelope"),
            FieldDecl::of::<TunedSample>("low_pitch_tuned_sample"),
            FieldDecl::of::<TunedSample>("normal_pitch_tuned_sample"),
            FieldDecl::of::<TunedSample>("high_pitch_tuned_sample"),
        ],
    );

    pub const ENVELOPE_OFFSET: usize = 4;
    /// Offsets of the three sample pointers, low to high.
    pub const SAMPLE_OFFSETS: [usize; 3] = [8, 16, 24];

    pub fn tuned_samples(&self) -> [&TunedSample; 3] {
        [&self.low_pitch_tuned_sample, &self.normal_pitch_tuned_sample, &self.high_pitch_tuned_sample]
    }

    pub fn tuned_samples_mut(&mut self) -> [&mut TunedSample; 3] {
        [
            &mut self.low_pitch_tuned_sample,
            &mut self.normal_pitch_tuned_sample,
            &mut self.high_pitch_tuned_sample,
        ]
    }

    fn encode(&self, out: &mut [u8], stable: bool) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, stable)?;
        w.put(&self.is_relocated)?;
        w.put(&self.low_key_region)?;
        w.put(&self.high_key_region)?;
        w.put(&self.decay_index)?;
        w.put(&self.envelope)?;
        w.put(&self.low_pitch_tuned_sample)?;
        w.put(&self.normal_pitch_tuned_sample)?;
        w.put(&self.high_pitch_tuned_sample)
    }
}

impl Codec for Instrument {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = 0x10;
    const NAME: &'static str = "Instrument";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        Ok(Self {
            is_relocated: r.next()?,
            low_key_region: r.next()?,
            high_key_region: r.next()?,
            decay_index: r.next()?,
            envelope: r.next()?,
            low_pitch_tuned_sample: r.next()?,
            normal_pitch_tuned_sample: r.next()?,
            high_pitch_tuned_sample: r.next()?,
        })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.encode(out, false)
    }

    fn write_stable(&self, out: &mut [u8]) -> Result<()> {
        self.encode(out, true)
    }
}

// ============================================================================
// Drum
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Drum {
    pub decay_index: u8,
    pub pan: u8,
    pub is_relocated: bool,
    pub tuned_sample: TunedSample,
    pub envelope: Pointer<Envelope>,
}

impl Drum {
    pub const LAYOUT: StructLayout<6> = StructLayout::new(
        "Drum",
        [
            FieldDecl::of::<u8>("decay_index"),
            FieldDecl::of::<u8>("pan"),
            FieldDecl::of::<bool>("is_relocated"),
            FieldDecl::padding("pad", 1),
            FieldDecl::of::<TunedSample>("tuned_sample"),
            FieldDecl::of::<Pointer<Envelope>>("envelope"),
        ],
    );

    pub const SAMPLE_OFFSET: usize = 4;
    pub const ENVELOPE_OFFSET: usize = 12;

    fn encode(&self, out: &mut [u8], stable: bool) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, stable)?;
        w.put(&self.decay_index)?;
        w.put(&self.pan)?;
        w.put(&self.is_relocated)?;
        w.pad()?;
        w.put(&self.tuned_sample)?;
        w.put(&self.envelope)
    }
}

impl Codec for Drum {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = 0x10;
    const NAME: &'static str = "Drum";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        let decay_index = r.next()?;
        let pan = r.next()?;
        let is_relocated = r.next()?;
        r.skip()?;
        Ok(Self { decay_index, pan, is_relocated, tuned_sample: r.next()?, envelope: r.next()? })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.encode(out, false)
    }

    fn write_stable(&self, out: &mut [u8]) -> Result<()> {
        self.encode(out, true)
    }
}
