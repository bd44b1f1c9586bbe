//! End-to-end tests across the whole workspace
//!
//! These tests verify the complete workflows:
//! 1. Parse a bank from an index entry and blob, recompile, reparse
//! 2. Decode envelope streams terminated by an ADSR opcode
//! 3. Walk a sequence from its metadata stream to its channels
//! 4. Build a multi-bank audiobank and read every bank back

use z64_audiobank::*;
use z64_audioseq::{parse_with_stats, AseqVersion, ParserConfig};
use z64_linker::LinkConfig;
use z64_types::Codec;

// ============================================================================
// Instrument banks
// ============================================================================

#[test]
fn test_minimal_bank_parse_compile_parse() {
    let entry = AudiobankIndexEntry {
        rom_addr: 0,
        bank_size: 0x30,
        num_instruments: 1,
        num_drums: 0,
        num_effects: 0,
        ..AudiobankIndexEntry::default()
    };
    let mut blob = vec![0u8; 0x30];
    blob[0x08..0x0C].copy_from_slice(&0x10u32.to_be_bytes());
    blob[0x10..0x14].copy_from_slice(&[0x00, 0x05, 0x60, 0xF0]);

    let bank = InstrumentBank::parse_bytes(&entry.to_bytes().unwrap(), &blob).unwrap();
    assert_eq!(bank.instruments.len(), 1);
    assert!(bank.drums.is_empty());
    assert!(bank.effects.is_empty());
    let original = *bank.instrument(0).unwrap();

    let (entry_bytes, data) = bank.to_bytes(false).unwrap();
    let reparsed = InstrumentBank::parse_bytes(&entry_bytes, &data).unwrap();
    assert_eq!(reparsed.instrument(0), Some(&original));
}

#[test]
fn test_truncated_entry_round_trip() {
    let entry = AudiobankIndexEntry { num_instruments: 2, num_drums: 1, sample_bank_id_1: 3, ..Default::default() };
    let full = entry.to_bytes().unwrap();
    let short = AudiobankIndexEntry::parse(&full[8..]).unwrap();
    assert_eq!(short.num_instruments, 2);
    assert_eq!(short.num_drums, 1);
    assert_eq!(short.sample_bank_id_1, 3);
    assert_eq!((short.rom_addr, short.bank_size), (0, 0));
}

// ============================================================================
// Envelopes
// ============================================================================

#[test]
fn test_envelope_points_until_opcode() {
    let stream = [0x00, 0x0A, 0x00, 0x14, 0x00, 0x14, 0x7F, 0xFF, 0xFF, 0xFF, 0x00, 0x00];
    let env = Envelope::read(&stream, 0).unwrap();
    assert_eq!(env.len(), 3);
    let last = env.points.at(2).unwrap();
    assert!(last.is_opcode());
    assert!(last.opcode().is_some_and(|op| op.is(AdsrOpcode::Hang)));
    assert_eq!(env.to_bytes().unwrap(), stream);
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn test_sequence_metadata_to_channel() {
    let (seq, stats) = parse_with_stats(&[0x90, 0x00, 0x03, 0xFF], ParserConfig::DEFAULT).unwrap();
    assert_eq!(stats.dequeued, 2);
    let meta = seq.get_section(0).unwrap();
    let channel = seq.get_channel(meta, 0).unwrap();
    assert!(channel.messages.iter().all(|m| m.is_terminal()));
}

#[test]
fn test_sequence_versions_agree_on_shared_opcodes() {
    let data = [0x90, 0x00, 0x04, 0xFF, 0xDF, 0x7F, 0xFF];
    let oot = parse_with_stats(&data, ParserConfig::with_version(AseqVersion::Oot)).unwrap().0;
    let mm = parse_with_stats(&data, ParserConfig::with_version(AseqVersion::Mm)).unwrap().0;
    let names = |seq: &z64_audioseq::AudioSequence| -> Vec<&'static str> {
        let meta = seq.get_section(0).unwrap();
        seq.get_channel(meta, 0).unwrap().messages.iter().map(|m| m.name()).collect()
    };
    assert_eq!(names(&oot), ["vol", "end"]);
    assert_eq!(names(&oot), names(&mm));
}

// ============================================================================
// Audiobank
// ============================================================================

fn build_bank(instruments: u8) -> InstrumentBank {
    let mut bank = InstrumentBank::new(AudiobankIndexEntry::default());
    let sample = bank.add_sample(
        Sample::new(AudioSampleCodec::Adpcm, AudioStorageMedium::Cart, 0x400, 0x100 * instruments as u32).unwrap(),
    );
    for i in 0..instruments {
        // A fresh but identical envelope per instrument; the linker shares them.
        let env = bank.add_envelope(Envelope::new(vec![
            EnvelopePoint::new(2, 32000),
            EnvelopePoint::op(AdsrOpcode::Hang, 0),
        ]));
        bank.add_instrument(Instrument {
            low_key_region: i,
            envelope: env,
            normal_pitch_tuned_sample: TunedSample::new(sample, 1.0),
            ..Instrument::default()
        });
    }
    bank
}

#[test]
fn test_audiobank_of_compiled_banks() {
    let mut blob = Vec::new();
    let mut entries = Vec::new();
    for bank in [build_bank(2), build_bank(3)] {
        let compiled = bank.compile(LinkConfig::DEFAULT).unwrap();
        let mut entry = compiled.index_entry;
        entry.rom_addr = blob.len() as u32;
        blob.extend_from_slice(&compiled.data);
        entries.push(Some(entry));
    }
    entries.push(None);
    let index = AudiobankIndex { entries }.to_bytes().unwrap();

    let audiobank = Audiobank::parse_bytes(&index, &blob).unwrap();
    assert_eq!(audiobank.len(), 3);
    assert!(audiobank.bank(2).is_none());

    let first = audiobank.bank(0).unwrap();
    assert_eq!(first.instruments.len(), 2);
    assert_eq!(first.objects.envelopes.len(), 1);
    assert_eq!(first.objects.samples.len(), 1);

    let second = audiobank.bank(1).unwrap();
    assert_eq!(second.instruments.len(), 3);
    assert_eq!(second.instrument(2).unwrap().low_key_region, 2);
    let sample = second.sample(&second.instrument(0).unwrap().normal_pitch_tuned_sample).unwrap();
    assert_eq!(sample.sample_addr, 0x300);
    assert!(sample.codec().unwrap().is(AudioSampleCodec::Adpcm));
}
