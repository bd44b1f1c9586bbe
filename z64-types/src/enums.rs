//! # Integer-backed enums
//!
//! Domain enums are small integer-to-symbol mappings. Decoding never fails on
//! an unlisted value: it is kept as `EnumValue::Unknown` and written back
//! unchanged.

use std::fmt;

use crate::codec::Codec;
use crate::error::Result;
use crate::primitive::Primitive;

pub trait IntEnum: Copy + Eq + fmt::Debug {
    type Repr: Primitive;

    fn from_repr(raw: Self::Repr) -> Option<Self>;
    fn to_repr(self) -> Self::Repr;
    fn symbol(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnumValue<E: IntEnum> {
    Known(E),
    Unknown(E::Repr),
}

impl<E: IntEnum> EnumValue<E> {
    pub fn from_raw(raw: E::Repr) -> Self {
        match E::from_repr(raw) {
            Some(value) => EnumValue::Known(value),
            None => EnumValue::Unknown(raw),
        }
    }

    pub fn raw(&self) -> E::Repr {
        match *self {
            EnumValue::Known(value) => value.to_repr(),
            EnumValue::Unknown(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<E> {
        match *self {
            EnumValue::Known(value) => Some(value),
            EnumValue::Unknown(_) => None,
        }
    }

    pub fn is(&self, value: E) -> bool {
        self.known() == Some(value)
    }
}

impl<E: IntEnum> From<E> for EnumValue<E> {
    fn from(value: E) -> Self {
        EnumValue::Known(value)
    }
}

impl<E: IntEnum> fmt::Display for EnumValue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Known(value) => f.write_str(value.symbol()),
            EnumValue::Unknown(raw) => write!(f, "{:?}", raw),
        }
    }
}

impl<E: IntEnum> Codec for EnumValue<E> {
    const SIZE: usize = <E::Repr as Codec>::SIZE;
    const ALIGN: usize = <E::Repr as Codec>::ALIGN;
    const NAME: &'static str = <E::Repr as Codec>::NAME;

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        E::Repr::read(buf, offset).map(Self::from_raw)
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        self.raw().write(out)
    }
}

/// Declare an enum with an integer representation and its [`IntEnum`] impl.
///
/// ```
/// z64_types::int_enum! {
///     pub enum Mode: i8 {
///         Off = 0,
///         Hold = -1,
///     }
/// }
/// use z64_types::IntEnum;
/// assert_eq!(Mode::from_repr(-1), Some(Mode::Hold));
/// assert_eq!(Mode::Hold.symbol(), "Hold");
/// ```
#[macro_export]
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::IntEnum for $name {
            type Repr = $repr;

            fn from_repr(raw: $repr) -> Option<Self> {
                $( if raw == $value { return Some(Self::$variant); } )+
                None
            }

            fn to_repr(self) -> $repr {
                match self {
                    $( Self::$variant => $value ),+
                }
            }

            fn symbol(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant) ),+
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::int_enum! {
        enum Color: u8 {
            Red = 1,
            Green = 2,
        }
    }

    #[test]
    fn test_known_and_unknown() {
        assert_eq!(EnumValue::<Color>::from_raw(2), EnumValue::Known(Color::Green));
        let unknown = EnumValue::<Color>::from_raw(9);
        assert_eq!(unknown, EnumValue::Unknown(9));
        assert_eq!(unknown.raw(), 9);
        assert_eq!(unknown.known(), None);
    }

    #[test]
    fn test_codec_preserves_raw() {
        let value = EnumValue::<Color>::read(&[0x7F], 0).unwrap();
        assert_eq!(value.to_bytes().unwrap(), vec![0x7F]);
        let value = EnumValue::<Color>::read(&[0x01], 0).unwrap();
        assert!(value.is(Color::Red));
        assert_eq!(value.to_string(), "Red");
    }
}
