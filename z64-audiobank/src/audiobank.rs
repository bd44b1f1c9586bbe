//! The whole audiobank file: every bank named by the index, parsed from
//! its slice of the blob.

use crate::bank::InstrumentBank;
use crate::error::{BankError, Result};
use crate::index::AudiobankIndex;

#[derive(Debug, Clone)]
pub struct Audiobank {
    pub index: AudiobankIndex,
    /// One slot per index entry; `None` where the entry is empty.
    pub banks: Vec<Option<InstrumentBank>>,
}

impl Audiobank {
    pub fn parse(index: AudiobankIndex, audiobank: &[u8]) -> Result<Self> {
        let mut banks = Vec::with_capacity(index.len());
        for (i, entry) in index.entries.iter().enumerate() {
            let Some(entry) = entry else {
                banks.push(None);
                continue;
            };
            let start = entry.rom_addr as u64;
            let end = start + entry.bank_size as u64;
            let blob = audiobank
                .get(start as usize..end as usize)
                .ok_or(BankError::BankOutOfRange { index: i, start, end, available: audiobank.len() })?;
            banks.push(Some(InstrumentBank::parse(*entry, blob)?));
        }
        Ok(Self { index, banks })
    }

    /// Parse both halves from raw bytes.
    pub fn parse_bytes(index: &[u8], audiobank: &[u8]) -> Result<Self> {
        Self::parse(AudiobankIndex::parse(index)?, audiobank)
    }

    pub fn bank(&self, index: usize) -> Option<&InstrumentBank> {
        self.banks.get(index)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_bytes(entries: &[(u32, u32, u8)]) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x10 + entries.len() * 16];
        bytes[..2].copy_from_slice(&(entries.len() as u16).to_be_bytes());
        for (i, &(rom_addr, size, instruments)) in entries.iter().enumerate() {
            let e = 0x10 + i * 16;
            bytes[e..e + 4].copy_from_slice(&rom_addr.to_be_bytes());
            bytes[e + 4..e + 8].copy_from_slice(&size.to_be_bytes());
            bytes[e + 8] = 2;
            bytes[e + 12] = instruments;
        }
        bytes
    }

    #[test]
    fn test_banks_are_sliced_by_entry() {
        let mut blob = vec![0u8; 0x40];
        // Bank 1 at 0x10: one instrument at bank offset 0x10.
        blob[0x18..0x1C].copy_from_slice(&0x10u32.to_be_bytes());
        blob[0x20 + 2] = 0x7F;
        let index = index_bytes(&[(0, 0x10, 0), (0x10, 0x30, 1), (0, 0, 0)]);
        let audiobank = Audiobank::parse_bytes(&index, &blob).unwrap();
        assert_eq!(audiobank.len(), 3);
        assert!(audiobank.bank(0).unwrap().instruments.is_empty());
        let bank = audiobank.bank(1).unwrap();
        assert_eq!(bank.instrument(0).unwrap().high_key_region, 0x7F);
        assert!(audiobank.bank(2).is_none());
    }

    #[test]
    fn test_bank_past_end_of_blob() {
        let index = index_bytes(&[(0x20, 0x40, 0)]);
        let err = Audiobank::parse_bytes(&index, &[0u8; 0x40]).unwrap_err();
        assert_eq!(err, BankError::BankOutOfRange { index: 0, start: 0x20, end: 0x60, available: 0x40 });
        assert!(err.is_structural());
    }
}
