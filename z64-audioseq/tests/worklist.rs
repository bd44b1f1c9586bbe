//! Integration tests for sequence fragment discovery
//!
//! - Channel and layer loads populate slots and are decoded once
//! - Calls and back-references terminate through the visited set
//! - Note mode selects between the two note instruction sets
//! - Data fragments are decoded with their own readers
//! - Bytes cut off by the end of the buffer are a structural error
//! - Arbitrary bytes never panic or read out of bounds

use proptest::prelude::*;
use z64_audioseq::*;

fn run(data: &[u8], version: AseqVersion) -> (AudioSequence, ParseStats) {
    parse_with_stats(data, ParserConfig::with_version(version)).unwrap()
}

fn names(messages: &[Message]) -> Vec<&'static str> {
    messages.iter().map(Message::name).collect()
}

#[test]
fn test_load_channel_then_end() {
    let (seq, stats) = run(&[0x90, 0x00, 0x03, 0xFF], AseqVersion::Oot);
    assert_eq!(stats.dequeued, 2);
    assert_eq!(stats.revisits, 0);
    let meta = seq.get_section(0).unwrap();
    assert_eq!(names(&meta.messages), ["ldchan", "end"]);
    let channel = seq.get_channel(meta, 0).unwrap();
    assert_eq!(channel.index, 0);
    assert_eq!(names(&channel.messages), ["end"]);
    assert!(seq.get_channel(meta, 1).is_none());
}

#[test]
fn test_self_call_terminates() {
    let (seq, stats) = run(&[0xFC, 0x00, 0x00, 0xFF], AseqVersion::Oot);
    assert_eq!(stats.dequeued, 2);
    assert_eq!(stats.revisits, 1);
    assert!(seq.calls.is_empty());
}

#[test]
fn test_mutual_reference_terminates() {
    let data = [
        0x90, 0x00, 0x04, 0xFF, // meta
        0xFC, 0x00, 0x08, 0xFF, // channel: call 0x08
        0xFC, 0x00, 0x04, 0xFF, // call: call back into the channel
    ];
    let (seq, stats) = run(&data, AseqVersion::Oot);
    assert_eq!(stats.revisits, 1);
    assert_eq!(seq.calls.len(), 1);
    let call = &seq.calls[&0x08];
    assert_eq!(call.section(), Section::Channel);
    assert_eq!(names(&call.messages), ["call", "end"]);
}

#[test]
fn test_note_mode_follows_toggles() {
    let data = [
        0x90, 0x00, 0x04, // 00 ldchan 0
        0xFF, // 03 end
        0xC4, // 04 legato
        0x88, 0x00, 0x0D, // 05 ldlayer 0 (legato)
        0xC3, // 08 nolegato
        0x89, 0x00, 0x15, // 09 ldlayer 1 (staccato)
        0xFF, // 0C end
        0x10, 0x05, 0x40, 0x7F, // 0D notedvg
        0xC5, // 11 nolegato
        0x10, 0x05, // 12 shortdvg
        0xFF, // 14 end
        0x10, 0x05, 0xFF, // 15 shortdvg, end
    ];
    let (seq, stats) = run(&data, AseqVersion::Oot);
    assert_eq!(stats.unknown_opcodes, 0);
    let meta = seq.get_section(0).unwrap();
    let channel = seq.get_channel(meta, 0).unwrap();
    assert!(!channel.is_legato);

    let first = seq.get_layer(channel, 0).unwrap();
    assert_eq!(names(&first.messages), ["notedvg", "nolegato", "shortdvg", "end"]);
    assert_eq!(first.messages[0].size(), 4);
    assert!(!first.is_legato);

    let second = seq.get_layer(channel, 1).unwrap();
    assert_eq!(names(&second.messages), ["shortdvg", "end"]);
}

#[test]
fn test_shared_layer_decoded_once() {
    let data = [
        0x90, 0x00, 0x07, // 00 ldchan 0
        0x91, 0x00, 0x0B, // 03 ldchan 1
        0xFF, // 06
        0x88, 0x00, 0x0F, 0xFF, // 07 channel 0
        0x88, 0x00, 0x0F, 0xFF, // 0B channel 1
        0xC0, 0x01, 0xFF, // 0F layer
    ];
    let (seq, stats) = run(&data, AseqVersion::Oot);
    assert_eq!(stats.dequeued, 4);
    assert_eq!(seq.channels.len(), 2);
    assert_eq!(seq.layers.len(), 1);
    let meta = seq.get_section(0).unwrap();
    let a = seq.get_channel(meta, 0).unwrap();
    let b = seq.get_channel(meta, 1).unwrap();
    assert_eq!(a.layers[0], b.layers[0]);
    assert_eq!(names(&seq.get_layer(b, 0).unwrap().messages), ["ldelay", "end"]);
}

#[test]
fn test_call_from_layer_uses_layer_table() {
    let data = [
        0x90, 0x00, 0x04, 0xFF, // 00 meta
        0x88, 0x00, 0x08, 0xFF, // 04 channel
        0xC4, 0xFC, 0x00, 0x0D, 0xFF, // 08 layer: legato, call 0x0D
        0x10, 0x05, 0x40, 0x7F, 0xFF, // 0D call body
    ];
    let (seq, _) = run(&data, AseqVersion::Oot);
    let call = &seq.calls[&0x0D];
    assert_eq!(call.section(), Section::Layer);
    assert!(call.is_legato);
    assert_eq!(names(&call.messages), ["notedvg", "end"]);
    assert!(matches!(call.owner, Owner::Layer(_)));
}

#[test]
fn test_version_selects_table() {
    let data = [0x90, 0x00, 0x04, 0xFF, 0xA0, 0x00, 0x05, 0xFF];

    let (seq, _) = run(&data, AseqVersion::Mm);
    let meta = seq.get_section(0).unwrap();
    let channel = seq.get_channel(meta, 0).unwrap();
    assert_eq!(names(&channel.messages), ["a0", "end"]);

    // 0xA0 is not a channel opcode in the older table.
    let (seq, stats) = run(&data, AseqVersion::Oot);
    let meta = seq.get_section(0).unwrap();
    let channel = seq.get_channel(meta, 0).unwrap();
    assert_eq!(stats.unknown_opcodes, 1);
    assert_eq!(names(&channel.messages), ["cdelay", "cdelay", "end"]);
}

#[test]
fn test_data_fragments() {
    let mut data = vec![0u8; 0x52];
    data[..14].copy_from_slice(&[
        0xD1, 0x00, 0x20, // 00 array
        0x90, 0x00, 0x07, // 03 ldchan 0
        0xFF, // 06
        0xB0, 0x00, 0x30, // 07 filter
        0xC2, 0x00, 0x50, // 0A table
        0xFF, // 0D
    ]);
    for i in 0..16 {
        data[0x20 + i] = i as u8;
        data[0x30 + 2 * i..0x32 + 2 * i].copy_from_slice(&(i as i16 * 100).to_be_bytes());
    }

    let (seq, _) = run(&data, AseqVersion::Oot);
    assert_eq!(seq.arrays[&0x20].bytes[15], 15);
    assert_eq!(seq.filters[&0x30].coefficients[1], 100);
    assert!(seq.tables.contains_key(&0x50));
    assert_eq!(seq.fragment_count(), 5);
}

#[test]
fn test_truncated_filter_is_error() {
    let data = [0x90, 0x00, 0x04, 0xFF, 0xB0, 0x00, 0x08, 0xFF, 0x00, 0x01];
    let err = parse_with_stats(&data, ParserConfig::DEFAULT).unwrap_err();
    assert!(err.is_structural());
}

#[test]
fn test_truncated_call_operand_is_error() {
    let err = parse_with_stats(&[0x90, 0x00, 0x03, 0xFC, 0x00], ParserConfig::DEFAULT).unwrap_err();
    assert!(matches!(err, SequenceError::Layout(_)));
    assert!(err.is_structural());
}

#[test]
fn test_jump_does_not_end_stream() {
    let data = [
        0x90, 0x00, 0x04, 0xFF, // meta
        0xFB, 0x00, 0x04, 0xFE, 0xDF, 0x40, 0xFF, // channel: jump, delay1, vol, end
    ];
    let (seq, stats) = run(&data, AseqVersion::Oot);
    let meta = seq.get_section(0).unwrap();
    let channel = seq.get_channel(meta, 0).unwrap();
    assert_eq!(names(&channel.messages), ["jump", "delay1", "vol", "end"]);
    assert_eq!(stats.dequeued, 2);
}

#[test]
fn test_custom_registry() {
    static SPECS: [OpcodeSpec; 2] = [
        OpcodeSpec::one("stop", 0x00, SectionSet::ALL, &[]).terminal(),
        OpcodeSpec::new("go", 0x10, 0x1F, SectionSet::META, &[ArgShape::U16]).effect(Effect::LoadChannel),
    ];
    let registry = Registry::from_specs(&SPECS).unwrap();
    let (seq, _) = Parser::new(&[0x12, 0x00, 0x04, 0x00, 0x00], &registry, ParserConfig::DEFAULT)
        .unwrap()
        .parse()
        .unwrap();
    let meta = seq.get_section(0).unwrap();
    assert_eq!(seq.get_channel(meta, 2).unwrap().addr, 4);
    assert_eq!(format_message(&meta.messages[0]), "0000: go 2, 0x0004");
}

proptest! {
    #[test]
    fn prop_arbitrary_bytes_parse(data in prop::collection::vec(any::<u8>(), 0..256), mm in any::<bool>()) {
        let version = if mm { AseqVersion::Mm } else { AseqVersion::Oot };
        let (seq, stats) = match parse_with_stats(&data, ParserConfig::with_version(version)) {
            Ok(parsed) => parsed,
            Err(err) => {
                prop_assert!(err.is_structural());
                return Ok(());
            }
        };
        prop_assert_eq!(seq.sections.len(), 1);
        prop_assert!(stats.dequeued >= 1);

        let streams = seq.sections.iter().map(|m| &m.messages)
            .chain(seq.channels.iter().map(|(_, c)| &c.messages))
            .chain(seq.layers.iter().map(|(_, l)| &l.messages))
            .chain(seq.calls.values().map(|c| &c.messages));
        for messages in streams {
            for msg in messages {
                prop_assert!(msg.addr as usize + msg.size() <= data.len());
            }
        }
        for (_, channel) in seq.channels.iter() {
            prop_assert!((channel.addr as usize) < data.len());
        }
    }
}
