//! Text listing of a parsed sequence

use std::fmt;

use crate::message::Message;
use crate::sequence::AudioSequence;

/// Listing of every fragment, one `addr: name args` line per message.
pub struct Listing<'a>(pub &'a AudioSequence);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seq = self.0;
        writeln!(f, "; sequence ({}), {} fragments", seq.version, seq.fragment_count())?;

        for (i, meta) in seq.sections.iter().enumerate() {
            writeln!(f, "\n.meta_{i} @ 0x{:04X}", meta.addr)?;
            write_messages(f, &meta.messages)?;
        }
        for (handle, channel) in seq.channels.iter() {
            writeln!(
                f,
                "\n.channel_{}_{} @ 0x{:04X}",
                channel.section,
                handle.index(),
                channel.addr
            )?;
            write_messages(f, &channel.messages)?;
        }
        for (handle, layer) in seq.layers.iter() {
            let mode = if layer.is_legato { "legato" } else { "staccato" };
            writeln!(f, "\n.layer_{} @ 0x{:04X} ; {mode}", handle.index(), layer.addr)?;
            write_messages(f, &layer.messages)?;
        }
        for call in seq.calls.values() {
            writeln!(f, "\n.call @ 0x{:04X} ; {}", call.addr, call.section())?;
            write_messages(f, &call.messages)?;
        }
        for env in seq.envelopes.values() {
            writeln!(f, "\n.envelope @ 0x{:04X}", env.addr)?;
            for p in &env.points {
                writeln!(f, "  {}, {}", p.delay, p.arg)?;
            }
        }
        for filter in seq.filters.values() {
            writeln!(f, "\n.filter @ 0x{:04X}", filter.addr)?;
            writeln!(f, "  {}", join(filter.coefficients.iter()))?;
        }
        for array in seq.arrays.values() {
            writeln!(f, "\n.array @ 0x{:04X}", array.addr)?;
            writeln!(f, "  {}", join(array.bytes.iter()))?;
        }
        for table in seq.tables.values() {
            writeln!(f, "\n.table @ 0x{:04X}", table.addr)?;
        }
        Ok(())
    }
}

fn write_messages(f: &mut fmt::Formatter<'_>, messages: &[Message]) -> fmt::Result {
    for msg in messages {
        writeln!(f, "{}", format_message(msg))?;
    }
    Ok(())
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

/// Format one message as `addr: name args`.
pub fn format_message(msg: &Message) -> String {
    format!("{:04X}: {msg}", msg.addr)
}

/// Format a whole sequence.
pub fn format(seq: &AudioSequence) -> String {
    Listing(seq).to_string()
}
