//! # Opcode table
//!
//! One plain-data [`OpcodeSpec`] per instruction shape. Argbit instructions
//! cover a range of opcode bytes and carry a small immediate in the low bits;
//! for those [`OpcodeSpec::first`] and [`OpcodeSpec::last`] differ.
//!
//! Note-layer opcodes below `0xC0` exist twice, once per note mode. Which one
//! applies depends on the legato flag toggled earlier in the same stream.

use crate::args::ArgShape;
use crate::section::SectionSet;
use crate::version::Compat;

use ArgShape::*;

/// What a decoded instruction means to the fragment walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    None,
    /// Starts channel `argbit` at the u16 target.
    LoadChannel,
    /// Starts note layer `argbit` of the current channel at the u16 target.
    LoadLayer,
    /// Subroutine decoded against the caller's section.
    Call,
    /// Jump within the stream; targets are not walked.
    Branch { conditional: bool },
    Legato,
    Staccato,
    Envelope,
    Filter,
    Array,
    Table,
}

impl Effect {
    /// Whether the first argument is an address the walk follows.
    pub const fn follows_target(self) -> bool {
        !matches!(
            self,
            Effect::None | Effect::Branch { .. } | Effect::Legato | Effect::Staccato
        )
    }
}

/// Note-layer mode an opcode requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteMode {
    Any,
    Legato,
    Staccato,
}

impl NoteMode {
    pub const fn accepts(self, legato: bool) -> bool {
        match self {
            NoteMode::Any => true,
            NoteMode::Legato => legato,
            NoteMode::Staccato => !legato,
        }
    }

    pub const fn overlaps(self, other: NoteMode) -> bool {
        match (self, other) {
            (NoteMode::Legato, NoteMode::Staccato) | (NoteMode::Staccato, NoteMode::Legato) => false,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpcodeSpec {
    pub name: &'static str,
    pub first: u8,
    pub last: u8,
    pub sections: SectionSet,
    pub args: &'static [ArgShape],
    pub compat: Compat,
    pub note_mode: NoteMode,
    pub effect: Effect,
    /// Decoding of the current fragment stops after this instruction.
    pub terminal: bool,
}

impl OpcodeSpec {
    pub const fn new(name: &'static str, first: u8, last: u8, sections: SectionSet, args: &'static [ArgShape]) -> Self {
        Self {
            name,
            first,
            last,
            sections,
            args,
            compat: Compat::Both,
            note_mode: NoteMode::Any,
            effect: Effect::None,
            terminal: false,
        }
    }

    pub const fn one(name: &'static str, opcode: u8, sections: SectionSet, args: &'static [ArgShape]) -> Self {
        Self::new(name, opcode, opcode, sections, args)
    }

    pub const fn compat(self, compat: Compat) -> Self {
        Self { compat, ..self }
    }

    pub const fn effect(self, effect: Effect) -> Self {
        Self { effect, ..self }
    }

    pub const fn note_mode(self, note_mode: NoteMode) -> Self {
        Self { note_mode, ..self }
    }

    pub const fn terminal(self) -> Self {
        Self { terminal: true, ..self }
    }

    pub const fn is_argbit(&self) -> bool {
        self.first != self.last
    }

    pub const fn covers(&self, opcode: u8) -> bool {
        self.first <= opcode && opcode <= self.last
    }
}

const ALL: SectionSet = SectionSet::ALL;
const META: SectionSet = SectionSet::META;
const CHAN: SectionSet = SectionSet::CHANNEL;
const LAYER: SectionSet = SectionSet::LAYER;

const fn op(name: &'static str, opcode: u8, sections: SectionSet, args: &'static [ArgShape]) -> OpcodeSpec {
    OpcodeSpec::one(name, opcode, sections, args)
}

const fn argbit(name: &'static str, first: u8, last: u8, sections: SectionSet, args: &'static [ArgShape]) -> OpcodeSpec {
    OpcodeSpec::new(name, first, last, sections, args)
}

const fn branch(name: &'static str, opcode: u8, arg: &'static [ArgShape], conditional: bool) -> OpcodeSpec {
    op(name, opcode, ALL, arg).effect(Effect::Branch { conditional })
}

/// Every known instruction of both format revisions.
pub static OPCODES: &[OpcodeSpec] = &[
    // ========== Control flow (all sections) ==========
    op("end", 0xFF, ALL, &[]).terminal(),
    op("delay1", 0xFE, ALL, &[]),
    op("delay", 0xFD, SectionSet::META_CHANNEL, &[Var]),
    op("call", 0xFC, ALL, &[U16]).effect(Effect::Call),
    branch("jump", 0xFB, &[U16], false),
    branch("beqz", 0xFA, &[U16], true),
    branch("bltz", 0xF9, &[U16], true),
    op("loop", 0xF8, ALL, &[U8]),
    op("loopend", 0xF7, ALL, &[]),
    op("break", 0xF6, ALL, &[]),
    branch("bgez", 0xF5, &[U16], true),
    branch("rjump", 0xF4, &[S8], false),
    branch("rbeqz", 0xF3, &[S8], true),
    branch("rbltz", 0xF2, &[S8], true),
    // ========== Metadata: argbits ==========
    argbit("testchan", 0x00, 0x0F, META, &[]),
    argbit("stopchan", 0x40, 0x4F, META, &[]),
    argbit("subio", 0x50, 0x5F, META, &[]),
    argbit("ldres", 0x60, 0x6F, META, &[U8, U8]),
    argbit("stio", 0x70, 0x7F, META, &[]),
    argbit("ldio", 0x80, 0x8F, META, &[]),
    argbit("ldchan", 0x90, 0x9F, META, &[U16]).effect(Effect::LoadChannel),
    argbit("rldchan", 0xA0, 0xAF, META, &[S16]),
    argbit("ldseq", 0xB0, 0xBF, META, &[U8, U16]),
    // ========== Metadata ==========
    op("c2", 0xC2, META, &[U16]).compat(Compat::MM),
    op("c3", 0xC3, META, &[S16]).compat(Compat::MM),
    op("runseq", 0xC4, META, &[U8, U8]),
    op("scriptctr", 0xC5, META, &[U16]),
    op("stop", 0xC6, META, &[]),
    op("stseq", 0xC7, META, &[U8, U16]),
    op("sub", 0xC8, META, &[U8]),
    op("and", 0xC9, META, &[U8]),
    op("ldi", 0xCC, META, &[U8]),
    op("dyncall", 0xCD, META, &[U16]),
    op("rand", 0xCE, META, &[U8]),
    op("voicealloc", 0xD0, META, &[U8]),
    op("ldshortgatearr", 0xD1, META, &[U16]).effect(Effect::Array),
    op("ldshortvelarr", 0xD2, META, &[U16]).effect(Effect::Array),
    op("mutebhv", 0xD3, META, &[U8]),
    op("mute", 0xD4, META, &[]),
    op("mutescale", 0xD5, META, &[U8]),
    op("freechan", 0xD6, META, &[U16]),
    op("initchan", 0xD7, META, &[U16]),
    op("volscale", 0xD9, META, &[S8]),
    op("volmode", 0xDA, META, &[U8, U16]),
    op("vol", 0xDB, META, &[U8]),
    op("tempochg", 0xDC, META, &[S8]),
    op("tempo", 0xDD, META, &[U8]),
    op("rtranspose", 0xDE, META, &[S8]),
    op("transpose", 0xDF, META, &[S8]),
    op("ef", 0xEF, META, &[S16, U8]),
    op("freevoicelist", 0xF0, META, &[]),
    op("allocvoicelist", 0xF1, META, &[U8]),
    // ========== Channel: argbits ==========
    argbit("cdelay", 0x00, 0x0F, CHAN, &[]),
    argbit("ldsample", 0x10, 0x1F, CHAN, &[U16]),
    argbit("ldchan", 0x20, 0x2F, CHAN, &[U16]).effect(Effect::LoadChannel),
    argbit("stcio", 0x30, 0x3F, CHAN, &[U8]),
    argbit("ldcio", 0x40, 0x4F, CHAN, &[U8]),
    argbit("subio", 0x50, 0x5F, CHAN, &[]),
    argbit("ldio", 0x60, 0x6F, CHAN, &[]),
    argbit("stio", 0x70, 0x77, CHAN, &[]),
    argbit("rldlayer", 0x78, 0x7F, CHAN, &[S16]),
    argbit("testlayer", 0x80, 0x87, CHAN, &[]),
    argbit("ldlayer", 0x88, 0x8F, CHAN, &[U16]).effect(Effect::LoadLayer),
    argbit("dellayer", 0x90, 0x97, CHAN, &[]),
    argbit("dynldlayer", 0x98, 0x9F, CHAN, &[]),
    // ========== Channel ==========
    op("a0", 0xA0, CHAN, &[S16]).compat(Compat::MM),
    op("a1", 0xA1, CHAN, &[]).compat(Compat::MM),
    op("a2", 0xA2, CHAN, &[S16]).compat(Compat::MM),
    op("a3", 0xA3, CHAN, &[]).compat(Compat::MM),
    op("a4", 0xA4, CHAN, &[U8]).compat(Compat::MM),
    op("a5", 0xA5, CHAN, &[]).compat(Compat::MM),
    op("a6", 0xA6, CHAN, &[U8, S16]).compat(Compat::MM),
    op("a7", 0xA7, CHAN, &[U8]).compat(Compat::MM),
    op("randptr", 0xA8, CHAN, &[U16, U16]).compat(Compat::MM),
    op("ldfilter", 0xB0, CHAN, &[U16]).effect(Effect::Filter),
    op("freefilter", 0xB1, CHAN, &[]),
    op("ldseqtoptr", 0xB2, CHAN, &[U16]),
    op("filter", 0xB3, CHAN, &[U8]),
    op("ptrtodyntbl", 0xB4, CHAN, &[]),
    op("dyntbltoptr", 0xB5, CHAN, &[]),
    op("dyntblv", 0xB6, CHAN, &[]),
    op("randtoptr", 0xB7, CHAN, &[U16]),
    op("rand", 0xB8, CHAN, &[U8]),
    op("randvel", 0xB9, CHAN, &[U8]),
    op("randgate", 0xBA, CHAN, &[U8]),
    op("chorus", 0xBB, CHAN, &[U8, U16]),
    op("ptradd", 0xBC, CHAN, &[U16]),
    op("randptr", 0xBD, CHAN, &[U16, U16]).compat(Compat::OOT),
    op("samplestart", 0xBD, CHAN, &[U8]).compat(Compat::MM),
    op("unk_be", 0xBE, CHAN, &[U8]).compat(Compat::MM),
    op("instr", 0xC1, CHAN, &[U8]),
    op("dyntbl", 0xC2, CHAN, &[U16]).effect(Effect::Table),
    op("nolegato", 0xC3, CHAN, &[]).effect(Effect::Staccato),
    op("legato", 0xC4, CHAN, &[]).effect(Effect::Legato),
    op("dyntbllookup", 0xC5, CHAN, &[]),
    op("bank", 0xC6, CHAN, &[U8]),
    op("stseq", 0xC7, CHAN, &[U8, U16]),
    op("sub", 0xC8, CHAN, &[U8]),
    op("and", 0xC9, CHAN, &[U8]),
    op("mutebhv", 0xCA, CHAN, &[U8]),
    op("ldseq", 0xCB, CHAN, &[U16]),
    op("ldi", 0xCC, CHAN, &[U8]),
    op("stopchan", 0xCD, CHAN, &[U8]),
    op("ldptr", 0xCE, CHAN, &[U16]),
    op("stptrtoseq", 0xCF, CHAN, &[U16]),
    op("effects", 0xD0, CHAN, &[U8]),
    op("voicealloc", 0xD1, CHAN, &[U8]),
    op("sustain", 0xD2, CHAN, &[U8]),
    op("bend12", 0xD3, CHAN, &[S8]),
    op("reverb", 0xD4, CHAN, &[U8]),
    op("vibfreq", 0xD7, CHAN, &[U8]),
    op("vibdepth", 0xD8, CHAN, &[U8]),
    op("releaserate", 0xD9, CHAN, &[U8]),
    op("envelope", 0xDA, CHAN, &[U16]).effect(Effect::Envelope),
    op("transpose", 0xDB, CHAN, &[S8]),
    op("panweight", 0xDC, CHAN, &[U8]),
    op("pan", 0xDD, CHAN, &[U8]),
    op("freqscale", 0xDE, CHAN, &[U16]),
    op("vol", 0xDF, CHAN, &[U8]),
    op("expression", 0xE0, CHAN, &[U8]),
    op("vibfreqenv", 0xE1, CHAN, &[U8, U8, U8]),
    op("vibdepthenv", 0xE2, CHAN, &[U8, U8, U8]),
    op("vibdelay", 0xE3, CHAN, &[U8]),
    op("dyncall", 0xE4, CHAN, &[]),
    op("reverbindex", 0xE5, CHAN, &[U8]),
    op("samplebook", 0xE6, CHAN, &[U8]),
    op("loadparams", 0xE7, CHAN, &[U16]),
    op("params", 0xE8, CHAN, &[U8, U8, U8, U8, U8, U8, U8, U8]),
    op("voiceprio", 0xE9, CHAN, &[U8]),
    op("stop", 0xEA, CHAN, &[]),
    op("bankinstr", 0xEB, CHAN, &[U8, U8]),
    op("vibreset", 0xEC, CHAN, &[]),
    op("gain", 0xED, CHAN, &[U8]),
    op("bend2", 0xEE, CHAN, &[S8]),
    op("freevoicelist", 0xF0, CHAN, &[]),
    op("allocvoicelist", 0xF1, CHAN, &[U8]),
    // ========== Note layer: notes ==========
    argbit("notedvg", 0x00, 0x3F, LAYER, &[Var, U8, U8]).note_mode(NoteMode::Legato),
    argbit("notedv", 0x40, 0x7F, LAYER, &[Var, U8]).note_mode(NoteMode::Legato),
    argbit("notevg", 0x80, 0xBF, LAYER, &[U8, U8]).note_mode(NoteMode::Legato),
    argbit("shortdvg", 0x00, 0x3F, LAYER, &[Var]).note_mode(NoteMode::Staccato),
    argbit("shortdv", 0x40, 0x7F, LAYER, &[]).note_mode(NoteMode::Staccato),
    argbit("shortvg", 0x80, 0xBF, LAYER, &[]).note_mode(NoteMode::Staccato),
    // ========== Note layer ==========
    op("ldelay", 0xC0, LAYER, &[Var]),
    op("shortvel", 0xC1, LAYER, &[U8]),
    op("transpose", 0xC2, LAYER, &[S8]),
    op("shortdelay", 0xC3, LAYER, &[Var]),
    op("legato", 0xC4, LAYER, &[]).effect(Effect::Legato),
    op("nolegato", 0xC5, LAYER, &[]).effect(Effect::Staccato),
    op("instr", 0xC6, LAYER, &[U8]),
    op("portamento", 0xC7, LAYER, &[Portamento]),
    op("noportamento", 0xC8, LAYER, &[]),
    op("shortgate", 0xC9, LAYER, &[U8]),
    op("notepan", 0xCA, LAYER, &[U8]),
    op("envelope", 0xCB, LAYER, &[U16, U8]).effect(Effect::Envelope),
    op("nodrumpan", 0xCC, LAYER, &[]),
    op("stereo", 0xCD, LAYER, &[U8]),
    op("bend2", 0xCE, LAYER, &[S8]),
    op("releaserate", 0xCF, LAYER, &[U8]),
    argbit("ldshortvel", 0xD0, 0xDF, LAYER, &[]),
    argbit("ldshortgate", 0xE0, 0xEF, LAYER, &[]),
    op("f0", 0xF0, LAYER, &[S16]).compat(Compat::MM),
    op("surround", 0xF1, LAYER, &[U8]).compat(Compat::MM),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::Section;

    #[test]
    fn test_ranges_are_ordered() {
        for spec in OPCODES {
            assert!(spec.first <= spec.last, "{}", spec.name);
        }
    }

    #[test]
    fn test_flow_opcodes_in_every_section() {
        let end = OPCODES.iter().find(|s| s.name == "end").unwrap();
        assert!(end.terminal);
        for section in Section::ALL {
            assert!(end.sections.contains(section));
        }
        let delay = OPCODES.iter().find(|s| s.name == "delay").unwrap();
        assert!(!delay.sections.contains(Section::Layer));
    }

    #[test]
    fn test_only_pointer_effects_follow() {
        assert!(Effect::Call.follows_target());
        assert!(Effect::Envelope.follows_target());
        assert!(!Effect::Branch { conditional: false }.follows_target());
        assert!(!Effect::Legato.follows_target());
        for spec in OPCODES.iter().filter(|s| s.effect.follows_target()) {
            assert_eq!(spec.args.first(), Some(&ArgShape::U16), "{}", spec.name);
        }
    }

    #[test]
    fn test_note_mode() {
        assert!(NoteMode::Any.accepts(true));
        assert!(NoteMode::Legato.accepts(true));
        assert!(!NoteMode::Staccato.accepts(true));
        assert!(!NoteMode::Legato.overlaps(NoteMode::Staccato));
        assert!(NoteMode::Any.overlaps(NoteMode::Staccato));
    }
}
