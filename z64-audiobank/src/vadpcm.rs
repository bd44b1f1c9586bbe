//! VADPCM loop and codebook metadata.

use z64_types::codec::slot;
use z64_types::{Array, Codec, EnumValue, FieldDecl, FlexArray, Result, StructLayout, Z64Error};

use crate::enums::VadpcmLoopCount;

// ============================================================================
// Loop
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadpcmLoopHeader {
    pub loop_start: u32,
    pub loop_end: u32,
    pub loop_count: EnumValue<VadpcmLoopCount>,
    pub num_samples: u32,
}

impl VadpcmLoopHeader {
    pub const LAYOUT: StructLayout<4> = StructLayout::new(
        "VadpcmLoopHeader",
        [
            FieldDecl::of::<u32>("loop_start"),
            FieldDecl::of::<u32>("loop_end"),
            FieldDecl::of::<u32>("loop_count"),
            FieldDecl::of::<u32>("num_samples"),
        ],
    );
}

impl Codec for VadpcmLoopHeader {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = Self::LAYOUT.align;
    const NAME: &'static str = "VadpcmLoopHeader";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        Ok(Self {
            loop_start: r.next()?,
            loop_end: r.next()?,
            loop_count: r.next()?,
            num_samples: r.next()?,
        })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, false)?;
        w.put(&self.loop_start)?;
        w.put(&self.loop_end)?;
        w.put(&self.loop_count)?;
        w.put(&self.num_samples)
    }
}

/// Loop points plus the decoder state at the loop start.
///
/// The predictor state is only stored for loops that do not start at
/// sample 0.
#[derive(Debug, Clone, PartialEq)]
pub struct VadpcmLoop {
    pub header: VadpcmLoopHeader,
    pub predictors: Option<Array<i16, 16>>,
}

impl Codec for VadpcmLoop {
    const SIZE: usize = VadpcmLoopHeader::SIZE;
    const ALIGN: usize = 0x10;
    const NAME: &'static str = "VadpcmLoop";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let header = VadpcmLoopHeader::read(buf, offset)?;
        let predictors = if header.loop_start == 0 {
            None
        } else {
            Some(Array::read(buf, offset + VadpcmLoopHeader::SIZE)?)
        };
        Ok(Self { header, predictors })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.header.write(out)?;
        if let Some(predictors) = &self.predictors {
            predictors.write(slot(out, VadpcmLoopHeader::SIZE, predictors.size(), Self::NAME)?)?;
        }
        Ok(())
    }

    fn size(&self) -> usize {
        VadpcmLoopHeader::SIZE + self.predictors.as_ref().map_or(0, |p| p.size())
    }
}

// ============================================================================
// Codebook
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VadpcmBookHeader {
    pub order: i32,
    pub num_predictors: i32,
}

impl VadpcmBookHeader {
    pub const LAYOUT: StructLayout<2> = StructLayout::new(
        "VadpcmBookHeader",
        [FieldDecl::of::<i32>("order"), FieldDecl::of::<i32>("num_predictors")],
    );

    /// Number of `s16` coefficients that follow the header.
    pub fn coefficient_count(&self) -> Result<usize> {
        let count = 8i64 * self.order as i64 * self.num_predictors as i64;
        usize::try_from(count).map_err(|_| Z64Error::OutOfRange { type_name: "VadpcmBook", value: count as i128 })
    }
}

impl Codec for VadpcmBookHeader {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = Self::LAYOUT.align;
    const NAME: &'static str = "VadpcmBookHeader";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        Ok(Self { order: r.next()?, num_predictors: r.next()? })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, false)?;
        w.put(&self.order)?;
        w.put(&self.num_predictors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VadpcmBook {
    pub header: VadpcmBookHeader,
    pub predictors: FlexArray<i16>,
}

impl Codec for VadpcmBook {
    const SIZE: usize = VadpcmBookHeader::SIZE;
    const ALIGN: usize = 0x10;
    const NAME: &'static str = "VadpcmBook";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let header = VadpcmBookHeader::read(buf, offset)?;
        let count = header.coefficient_count()?;
        let predictors = FlexArray::read_len(buf, offset + VadpcmBookHeader::SIZE, count)?;
        Ok(Self { header, predictors })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.header.write(out)?;
        self.predictors
            .write(slot(out, VadpcmBookHeader::SIZE, self.predictors.size(), Self::NAME)?)
    }

    fn size(&self) -> usize {
        VadpcmBookHeader::SIZE + self.predictors.size()
    }
}
