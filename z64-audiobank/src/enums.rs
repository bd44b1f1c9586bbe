//! Audio engine enums.
//!
//! Values outside these tables are preserved through [`z64_types::EnumValue`].

use z64_types::int_enum;

int_enum! {
    /// Sample encoding.
    pub enum AudioSampleCodec: u8 {
        Adpcm = 0,
        S8 = 1,
        S16InMemory = 2,
        SmallAdpcm = 3,
        Reverb = 4,
        S16 = 5,
        Unk6 = 6,
        Unk7 = 7,
    }
}

int_enum! {
    /// Where a bank or sample lives.
    pub enum AudioStorageMedium: i8 {
        Ram = 0,
        Unk = 1,
        Cart = 2,
        DiskDrive = 3,
        RamUnloaded = 5,
    }
}

int_enum! {
    pub enum AudioCacheLoadType: i8 {
        Permanent = 0,
        Persistent = 1,
        Temporary = 2,
        Either = 3,
        EitherNoSync = 4,
    }
}

int_enum! {
    /// Envelope control opcodes, stored in place of a delay.
    pub enum AdsrOpcode: i16 {
        Disable = 0,
        Hang = -1,
        Goto = -2,
        Restart = -3,
    }
}

int_enum! {
    pub enum VadpcmLoopCount: u32 {
        NoLoop = 0,
        Indefinite = 0xFFFF_FFFF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z64_types::{Codec, EnumValue, IntEnum};

    #[test]
    fn test_symbols() {
        assert_eq!(AudioSampleCodec::from_repr(3), Some(AudioSampleCodec::SmallAdpcm));
        assert_eq!(AudioStorageMedium::from_repr(4), None);
        assert_eq!(AudioStorageMedium::RamUnloaded.to_repr(), 5);
        assert_eq!(AdsrOpcode::from_repr(-1), Some(AdsrOpcode::Hang));
        assert_eq!(VadpcmLoopCount::Indefinite.symbol(), "Indefinite");
    }

    #[test]
    fn test_unknown_medium_survives() {
        let value = EnumValue::<AudioStorageMedium>::read(&[0x04], 0).unwrap();
        assert_eq!(value, EnumValue::Unknown(4));
        assert_eq!(value.to_bytes().unwrap(), vec![0x04]);
    }
}
