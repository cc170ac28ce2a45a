use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use encoding_rs::SHIFT_JIS;

use crate::error::{DecodeError, EncodeError};

/// Quiet zone width in modules mandated by ISO/IEC 18004 for normal symbols.
pub const DEFAULT_MARGIN: u32 = 4;

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum ECLevel {
    L = 0,
    #[default]
    M = 1,
    Q = 2,
    H = 3,
}

impl From<ECLevel> for qirust::qrcode::QrCodeEcc {
    fn from(ecl: ECLevel) -> Self {
        use qirust::qrcode::QrCodeEcc;
        match ecl {
            ECLevel::L => QrCodeEcc::Low,
            ECLevel::M => QrCodeEcc::Medium,
            ECLevel::Q => QrCodeEcc::Quartile,
            ECLevel::H => QrCodeEcc::High,
        }
    }
}

// Character set
//------------------------------------------------------------------------------

/// Encoding applied to byte-mode payloads.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum CharacterSet {
    #[default]
    Iso8859_1,
    Utf8,
    ShiftJis,
}

impl Display for CharacterSet {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(match self {
            Self::Iso8859_1 => "ISO-8859-1",
            Self::Utf8 => "UTF-8",
            Self::ShiftJis => "Shift_JIS",
        })
    }
}

impl CharacterSet {
    pub const ALL: [CharacterSet; 3] = [Self::Iso8859_1, Self::Utf8, Self::ShiftJis];

    /// Serializes `text` into the bytes a byte-mode segment carries.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, EncodeError> {
        match self {
            Self::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            Self::Iso8859_1 => text
                .chars()
                .map(|ch| {
                    u8::try_from(u32::from(ch))
                        .map_err(|_| EncodeError::UnmappableChar { ch, charset: *self })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Cow::Owned),
            Self::ShiftJis => {
                let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
                if had_errors {
                    // Report the first character the table has no mapping for
                    let ch = text
                        .chars()
                        .find(|c| SHIFT_JIS.encode(c.encode_utf8(&mut [0; 4])).2)
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Err(EncodeError::UnmappableChar { ch, charset: *self });
                }
                Ok(bytes)
            }
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            Self::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidText(*self))
            }
            Self::Iso8859_1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::ShiftJis => SHIFT_JIS
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned)
                .ok_or(DecodeError::InvalidText(*self)),
        }
    }

    /// ECI assignment number announcing this set inside a symbol.
    pub fn eci(&self) -> u32 {
        match self {
            Self::Iso8859_1 => 3,
            Self::ShiftJis => 20,
            Self::Utf8 => 26,
        }
    }

    /// Decodes without a hint: UTF-8 when the bytes are well formed, ISO-8859-1 otherwise.
    pub fn guess_decode(bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_owned(),
            Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

// Encode options
//------------------------------------------------------------------------------

/// Symbol parameters for one encode call.
///
/// The whole record takes part in cache keys, so two calls only share a cached
/// image when every field matches.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct EncodeOptions {
    /// Target side length in pixels. `0` renders at one pixel per module.
    pub size: u32,
    pub ec_level: ECLevel,
    /// Quiet zone width in modules.
    pub margin: u32,
    pub character_set: CharacterSet,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            size: 0,
            ec_level: ECLevel::default(),
            margin: DEFAULT_MARGIN,
            character_set: CharacterSet::default(),
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn ec_level(mut self, ec_level: ECLevel) -> Self {
        self.ec_level = ec_level;
        self
    }

    pub fn margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn character_set(mut self, character_set: CharacterSet) -> Self {
        self.character_set = character_set;
        self
    }
}
