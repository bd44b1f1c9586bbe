//! # Index tables
//!
//! The `code` file carries one 16-byte entry per instrument bank and per
//! sample table. Randomizer tools ship bank entries in a truncated 8-byte
//! form that drops `rom_addr` and `bank_size`; those are accepted and
//! zero-filled.

use tracing::debug;
use z64_types::{Codec, EnumValue, FieldDecl, Primitive, Result, StructLayout, Z64Error};

use crate::enums::{AudioCacheLoadType, AudioStorageMedium};

// ============================================================================
// Audiobank index entry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudiobankIndexEntry {
    pub rom_addr: u32,
    pub bank_size: u32,
    pub medium: EnumValue<AudioStorageMedium>,
    pub cache_load_type: EnumValue<AudioCacheLoadType>,
    pub sample_bank_id_1: u8,
    pub sample_bank_id_2: u8,
    pub num_instruments: u8,
    pub num_drums: u8,
    pub num_effects: i16,
}

impl AudiobankIndexEntry {
    pub const LAYOUT: StructLayout<9> = StructLayout::new(
        "AudiobankIndexEntry",
        [
            FieldDecl::of::<u32>("rom_addr"),
            FieldDecl::of::<u32>("bank_size"),
            FieldDecl::of::<i8>("medium"),
            FieldDecl::of::<i8>("cache_load_type"),
            FieldDecl::of::<u8>("sample_bank_id_1"),
            FieldDecl::of::<u8>("sample_bank_id_2"),
            FieldDecl::of::<u8>("num_instruments"),
            FieldDecl::of::<u8>("num_drums"),
            FieldDecl::of::<i16>("num_effects"),
        ],
    );

    /// Length of the truncated on-disk form.
    pub const TRUNCATED_SIZE: usize = 8;

    /// Parse a full 16-byte entry or the truncated 8-byte form.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            16 => Self::read(bytes, 0),
            8 => {
                debug!("recovered truncated audiobank index entry");
                let mut full = [0u8; 16];
                full[8..].copy_from_slice(bytes);
                Self::read(&full, 0)
            }
            found => Err(Z64Error::InvalidEntrySize {
                type_name: "AudiobankIndexEntry",
                expected: "8 or 16",
                found,
            }),
        }
    }

    /// The last 8 bytes of the entry, as randomizer tools store it.
    pub fn to_truncated_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = self.to_bytes()?;
        Ok(bytes.split_off(Self::SIZE - Self::TRUNCATED_SIZE))
    }
}

impl Default for AudiobankIndexEntry {
    fn default() -> Self {
        Self {
            rom_addr: 0,
            bank_size: 0,
            medium: AudioStorageMedium::Cart.into(),
            cache_load_type: AudioCacheLoadType::Persistent.into(),
            sample_bank_id_1: 0,
            sample_bank_id_2: 0xFF,
            num_instruments: 0,
            num_drums: 0,
            num_effects: 0,
        }
    }
}

impl Codec for AudiobankIndexEntry {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = Self::LAYOUT.align;
    const NAME: &'static str = "AudiobankIndexEntry";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        Ok(Self {
            rom_addr: r.next()?,
            bank_size: r.next()?,
            medium: r.next()?,
            cache_load_type: r.next()?,
            sample_bank_id_1: r.next()?,
            sample_bank_id_2: r.next()?,
            num_instruments: r.next()?,
            num_drums: r.next()?,
            num_effects: r.next()?,
        })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, false)?;
        w.put(&self.rom_addr)?;
        w.put(&self.bank_size)?;
        w.put(&self.medium)?;
        w.put(&self.cache_load_type)?;
        w.put(&self.sample_bank_id_1)?;
        w.put(&self.sample_bank_id_2)?;
        w.put(&self.num_instruments)?;
        w.put(&self.num_drums)?;
        w.put(&self.num_effects)
    }
}

// ============================================================================
// Audiobank index
// ============================================================================

/// Offset of the first entry; the count sits in the first two bytes.
const INDEX_HEADER_SIZE: usize = 0x10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudiobankIndex {
    pub entries: Vec<Option<AudiobankIndexEntry>>,
}

impl AudiobankIndex {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let count = u16::read(bytes, 0)? as usize;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let entry = AudiobankIndexEntry::read(bytes, INDEX_HEADER_SIZE + i * AudiobankIndexEntry::SIZE)?;
            // Empty slots are all zero; bank 0 legitimately starts at 0.
            if entry.rom_addr == 0 && entry.bank_size == 0 {
                entries.push(None);
            } else {
                entries.push(Some(entry));
            }
        }
        Ok(Self { entries })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let count = u16::checked_from(self.entries.len() as i128)?;
        let mut out = vec![0u8; INDEX_HEADER_SIZE + self.entries.len() * AudiobankIndexEntry::SIZE];
        count.write(&mut out)?;
        for (i, entry) in self.entries.iter().enumerate() {
            if let Some(entry) = entry {
                let start = INDEX_HEADER_SIZE + i * AudiobankIndexEntry::SIZE;
                entry.write(&mut out[start..])?;
            }
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Audiotable index entry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudiotableIndexEntry {
    pub rom_addr: u32,
    pub table_size: u32,
    pub medium: EnumValue<AudioStorageMedium>,
    pub cache_load_type: EnumValue<AudioCacheLoadType>,
    pub short_data_1: i16,
    pub short_data_2: i16,
    pub short_data_3: i16,
}

impl AudiotableIndexEntry {
    pub const LAYOUT: StructLayout<7> = StructLayout::new(
        "AudiotableIndexEntry",
        [
            FieldDecl::of::<u32>("rom_addr"),
            FieldDecl::of::<u32>("table_size"),
            FieldDecl::of::<i8>("medium"),
            FieldDecl::of::<i8>("cache_load_type"),
            FieldDecl::of::<i16>("short_data_1"),
            FieldDecl::of::<i16>("short_data_2"),
            FieldDecl::of::<i16>("short_data_3"),
        ],
    );
}

impl Codec for AudiotableIndexEntry {
    const SIZE: usize = Self::LAYOUT.size;
    const ALIGN: usize = Self::LAYOUT.align;
    const NAME: &'static str = "AudiotableIndexEntry";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let layout = Self::LAYOUT;
        let mut r = layout.reader(buf, offset)?;
        Ok(Self {
            rom_addr: r.next()?,
            table_size: r.next()?,
            medium: r.next()?,
            cache_load_type: r.next()?,
            short_data_1: r.next()?,
            short_data_2: r.next()?,
            short_data_3: r.next()?,
        })
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        let layout = Self::LAYOUT;
        let mut w = layout.writer(out, false)?;
        w.put(&self.rom_addr)?;
        w.put(&self.table_size)?;
        w.put(&self.medium)?;
        w.put(&self.cache_load_type)?;
        w.put(&self.short_data_1)?;
        w.put(&self.short_data_2)?;
        w.put(&self.short_data_3)
    }
}
