//! Payload preparation for the two public encode paths.
//!
//! URIs are upper-cased so that typical `scheme:HEX` payloads fall entirely in
//! the QR alphanumeric set, which packs 45 symbols into 5.5 bits instead of
//! the 8 bits byte mode spends. Folding uses the locale-independent Unicode
//! mapping, so results do not depend on the host locale (no dotless-i
//! surprises under a Turkish locale).

use crate::options::{CharacterSet, ECLevel, EncodeOptions, DEFAULT_MARGIN};

/// Quiet zone used by the generic text path.
pub const TEXT_MARGIN: u32 = 5;

pub fn fold_uri(uri: &str) -> String {
    uri.to_uppercase()
}

impl EncodeOptions {
    /// Options for the URI path: level M, default margin and character set.
    pub fn uri(size: u32) -> Self {
        Self {
            size,
            ec_level: ECLevel::M,
            margin: DEFAULT_MARGIN,
            character_set: CharacterSet::default(),
        }
    }

    /// Options for the generic text path: level L, UTF-8, margin 5.
    pub fn text(size: u32) -> Self {
        Self { size, ec_level: ECLevel::L, margin: TEXT_MARGIN, character_set: CharacterSet::Utf8 }
    }
}
