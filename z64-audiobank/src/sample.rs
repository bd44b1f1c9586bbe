//! # Samples
//!
//! A [`Sample`] describes one waveform in a sample table: codec, storage
//! medium and byte size packed into a flags word, the waveform's offset in
//! its table, and pointers to its loop and codebook. A [`TunedSample`] pairs
//! a sample with the playback rate that maps it to middle C.

use z64_types::{BitField, Bitfield, BitfieldLayout, Codec, EnumValue, FieldDecl, Pointer, Result, StructLayout};

use crate::enums::{AudioSampleCodec, AudioStorageMedium};
use crate::vadpcm::{VadpcmBook, VadpcmLoop};

/// Flags word at the start of every [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFlagsLayout;

impl BitfieldLayout for SampleFlagsLayout {
    type Word = u32;
    const NAME: &'static str = "SampleFlags";
    const FIELDS: &'static [BitField] = &[
        BitField::new("unk_0", 1),
        BitField::new("codec", 3),
        BitField::new("medium", 2),
        BitField::new("is_cached", 1),
        BitField::new("is_relocated", 1),
        BitField::new("size", 24),
    ];
}

pub type SampleFlags = Bitfield<SampleFlagsLayout>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub flags: SampleFlags,
    /// Offset of the waveform inside its sample table.
    pub sample_addr: u32,
    pub vadpcm_loop: Pointer<VadpcmLoop>,
    pub book: Pointer<VadpcmBook>,
}

impl Sample {
    pub const LAYOUT: StructLayout<4> = StructLayout::new(
        "Sample",
        [
            FieldDecl::of::<SampleFlags>("flags"),
            FieldDecl::of::<u32>("sample_addr"),
            FieldDecl::of::<Pointer<VadpcmLoop>>("loop"),
            FieldDecl::of::<Pointer<VadpcmBook>>("book"),
        ],
    );

    pub const LOOP_OFFSET: usize = 8;
    pub const BOOK_OFFSET: usize = 12;

    /// Sample with no loop or codebook attached yet.
    pub fn new(codec: AudioSampleCodec, medium: AudioStorageMedium, size: u32, sample_addr: u32) -> Result<Self> {
        let mut flags = SampleFlags::new()?;
        flags.set_enum("codec", codec.into())?;
        flags.set_enum("medium", medium.into())?;
        flags.set("size", size as i64)?;
        Ok(Self { flags, sample_addr, vadpcm_loop: Pointer::null(), book: Pointer::null() })
    }

    pub fn codec(&self) -> Result<EnumValue<AudioSampleCodec>> {
        self.flags.get_enum("codec")
    }

    pub fn medium(&self) -> Result<EnumValue<AudioStorageMedium>> {
        self.flags.get_enum("medium")
    }

    pub fn is_cached(&self) -> Result<bool> {
        self.flags.get_bool("is_cached")
    }

    pub fn is_relocated(&self) -> Result<bool> {
        self.flags.get_bool("is_relocated")
    }

    /// Waveform size in bytes.
    pub fn data_size(&self) -> Result<u32> {
        Ok(self.flags.get("size")? as u32)
    }
}

impl Codec for Sample {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = 0x10;
    const NAME: &'static str = "Sample";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        Ok(Self {
            flags: r.next()?,
            sample_addr: r.next()?,
            vadpcm_loop: r.next()?,
            book: r.next()?,
        })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.encode(out, false)
    }

    fn write_stable(&self, out: &mut [u8]) -> Result<()> {
        self.encode(out, true)
    }
}

impl Sample {
    fn encode(&self, out: &mut [u8], stable: bool) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, stable)?;
        w.put(&self.flags)?;
        w.put(&self.sample_addr)?;
        w.put(&self.vadpcm_loop)?;
        w.put(&self.book)
    }
}

/// A sample reference plus its tuning; embedded in instruments, drums and
/// the effect list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TunedSample {
    pub sample: Pointer<Sample>,
    pub tuning: f32,
}

impl TunedSample {
    pub const LAYOUT: StructLayout<2> = StructLayout::new(
        "TunedSample",
        [FieldDecl::of::<Pointer<Sample>>("sample"), FieldDecl::of::<f32>("tuning")],
    );

    pub fn new(sample: Pointer<Sample>, tuning: f32) -> Self {
        Self { sample, tuning }
    }

    /// No sample and zero tuning: the all-zero record.
    pub fn is_empty(&self) -> bool {
        self.sample.is_null() && self.tuning.to_bits() == 0
    }

    pub(crate) fn encode(&self, out: &mut [u8], stable: bool) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, stable)?;
        w.put(&self.sample)?;
        w.put(&self.tuning)
    }
}

impl Codec for TunedSample {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = Self::LAYOUT.align;
    const NAME: &'static str = "TunedSample";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        Ok(Self { sample: r.next()?, tuning: r.next()? })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.encode(out, false)
    }

    fn write_stable(&self, out: &mut [u8]) -> Result<()> {
        self.encode(out, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [u8; 16] = [
        0x02, 0x00, 0x3A, 0x20, // cached, size 0x3A20
        0x00, 0x01, 0x00, 0x00, // sample_addr
        0x00, 0x00, 0x00, 0x40, // loop
        0x00, 0x00, 0x00, 0x60, // book
    ];

    #[test]
    fn test_layout() {
        assert_eq!(Sample::SIZE, 0x10);
        assert_eq!(Sample::LAYOUT.offset_of("loop"), Some(Sample::LOOP_OFFSET));
        assert_eq!(Sample::LAYOUT.offset_of("book"), Some(Sample::BOOK_OFFSET));
        assert_eq!(TunedSample::SIZE, 8);
        assert_eq!(TunedSample::ALIGN, 4);
    }

    #[test]
    fn test_read_sample() {
        let sample = Sample::read(&SAMPLE, 0).unwrap();
        assert!(sample.codec().unwrap().is(AudioSampleCodec::Adpcm));
        assert!(sample.medium().unwrap().is(AudioStorageMedium::Ram));
        assert!(sample.is_cached().unwrap());
        assert!(!sample.is_relocated().unwrap());
        assert_eq!(sample.data_size().unwrap(), 0x3A20);
        assert_eq!(sample.sample_addr, 0x10000);
        assert_eq!(sample.vadpcm_loop.addr(), 0x40);
        assert_eq!(sample.book.addr(), 0x60);
        assert_eq!(sample.to_bytes().unwrap(), SAMPLE.to_vec());
    }

    #[test]
    fn test_stable_bytes_hide_pointers() {
        let sample = Sample::read(&SAMPLE, 0).unwrap();
        let stable = sample.stable_bytes().unwrap();
        assert_eq!(&stable[..8], &SAMPLE[..8]);
        assert_eq!(&stable[8..], &[0xFF; 8]);
    }

    #[test]
    fn test_new_sample_flags() {
        let sample = Sample::new(AudioSampleCodec::SmallAdpcm, AudioStorageMedium::Cart, 0x100, 0x2000).unwrap();
        let bytes = sample.to_bytes().unwrap();
        // codec 3, medium 2 -> 0 011 10 0 0
        assert_eq!(&bytes[..4], &[0b0011_1000, 0x00, 0x01, 0x00]);
        assert!(Sample::new(AudioSampleCodec::Adpcm, AudioStorageMedium::Cart, 0x0100_0000, 0).is_err());
    }

    #[test]
    fn test_tuned_sample() {
        let ts = TunedSample::read(&[0, 0, 0, 0x20, 0x3F, 0x80, 0, 0], 0).unwrap();
        assert_eq!(ts.sample.addr(), 0x20);
        assert_eq!(ts.tuning, 1.0);
        assert!(!ts.is_empty());
        assert!(TunedSample::read(&[0; 8], 0).unwrap().is_empty());
        assert_eq!(ts.stable_bytes().unwrap(), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x3F, 0x80, 0, 0]);
    }
}
