//! # ADSR envelopes
//!
//! An envelope is a run of `(time_or_opcode, amp_or_index)` pairs. A
//! positive first value is a delay; zero or negative is an [`AdsrOpcode`]
//! and ends the run, exactly as the audio driver walks it.

use z64_types::{Codec, EnumValue, FieldDecl, FlexArray, IntEnum, Result, StructLayout};

use crate::enums::AdsrOpcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvelopePoint {
    pub time_or_opcode: i16,
    pub amp_or_index: i16,
}

impl EnvelopePoint {
    pub const LAYOUT: StructLayout<2> = StructLayout::new(
        "EnvelopePoint",
        [FieldDecl::of::<i16>("time_or_opcode"), FieldDecl::of::<i16>("amp_or_index")],
    );

    pub const fn new(time_or_opcode: i16, amp_or_index: i16) -> Self {
        Self { time_or_opcode, amp_or_index }
    }

    /// Control point built from an opcode.
    pub fn op(opcode: AdsrOpcode, amp_or_index: i16) -> Self {
        Self::new(opcode.to_repr(), amp_or_index)
    }

    pub fn is_opcode(&self) -> bool {
        self.time_or_opcode <= 0
    }

    pub fn opcode(&self) -> Option<EnumValue<AdsrOpcode>> {
        self.is_opcode().then(|| EnumValue::from_raw(self.time_or_opcode))
    }
}

impl Codec for EnvelopePoint {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = Self::LAYOUT.align;
    const NAME: &'static str = "EnvelopePoint";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        Ok(Self { time_or_opcode: r.next()?, amp_or_index: r.next()? })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, false)?;
        w.put(&self.time_or_opcode)?;
        w.put(&self.amp_or_index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Envelope {
    pub points: FlexArray<EnvelopePoint>,
}

impl Envelope {
    pub fn new(points: Vec<EnvelopePoint>) -> Self {
        Self { points: points.into() }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Codec for Envelope {
    const SIZE: usize = 0;
    const ALIGN: usize = 0x10;
    const NAME: &'static str = "Envelope";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        Ok(Self { points: FlexArray::read_until(buf, offset, EnvelopePoint::is_opcode)? })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.points.write(out)
    }

    fn size(&self) -> usize {
        self.points.size()
    }
}
