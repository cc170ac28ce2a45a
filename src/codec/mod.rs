//! Façade over the QR symbology.
//!
//! Encoding produces a [`BitMatrix`] that already carries the quiet zone and is
//! scaled to the requested side. Decoding binarizes a [`LuminanceView`] with a
//! hybrid binarizer before handing the bitmap to the grid detector.

pub mod binarize;
pub mod reader;
pub mod writer;

use crate::error::QRResult;
use crate::matrix::BitMatrix;
use crate::options::{CharacterSet, EncodeOptions};
use crate::raster::LuminanceView;

pub trait QRCodec: Send + Sync {
    /// Encodes `text` into a square matrix of side `max(size, natural)`, where
    /// `natural` is the symbol width plus twice the margin.
    ///
    /// `size` takes precedence over `opts.size`.
    fn encode(&self, text: &str, size: u32, opts: &EncodeOptions) -> QRResult<BitMatrix>;

    fn decode(&self, view: &LuminanceView) -> QRResult<String>;
}

// Standard codec
//------------------------------------------------------------------------------

/// Deterministic codec backed by the `qirust` encoder and the `rqrr` decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCodec {
    decode_charset: Option<CharacterSet>,
}

impl StandardCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes byte segments under `charset` instead of guessing.
    pub fn with_decode_charset(charset: CharacterSet) -> Self {
        Self { decode_charset: Some(charset) }
    }
}

impl QRCodec for StandardCodec {
    fn encode(&self, text: &str, size: u32, opts: &EncodeOptions) -> QRResult<BitMatrix> {
        writer::write(text, size, opts)
    }

    fn decode(&self, view: &LuminanceView) -> QRResult<String> {
        reader::read(view, self.decode_charset)
    }
}

#[cfg(test)]
mod codec_tests {
    use test_case::test_case;

    use super::{QRCodec, StandardCodec};
    use crate::error::{DecodeError, EncodeError, QRError};
    use crate::options::{CharacterSet, ECLevel, EncodeOptions};
    use crate::raster::{bitmatrix_to_pixels, pixels_to_luminance, PixelImage, WHITE};

    fn round_trip(codec: &StandardCodec, text: &str, size: u32, opts: &EncodeOptions) -> String {
        let bm = codec.encode(text, size, opts).unwrap();
        let img = bitmatrix_to_pixels(&bm).unwrap();
        codec.decode(&pixels_to_luminance(&img)).unwrap()
    }

    #[test_case("OPENPGP4FPR:1234ABCD", 240, ECLevel::M; "uri")]
    #[test_case("12345678901234567890", 200, ECLevel::Q; "numeric")]
    #[test_case("Hello, world!", 256, ECLevel::L; "bytes")]
    #[test_case("HTTPS://EXAMPLE.ORG/PATH?Q=1", 300, ECLevel::H; "alphanumeric_high")]
    fn test_round_trip(text: &str, size: u32, ecl: ECLevel) {
        let codec = StandardCodec::new();
        let opts = EncodeOptions::new().ec_level(ecl).size(size);
        assert_eq!(round_trip(&codec, text, size, &opts), text);
    }

    #[test]
    fn test_round_trip_utf8() {
        let codec = StandardCodec::with_decode_charset(CharacterSet::Utf8);
        let opts =
            EncodeOptions::new().ec_level(ECLevel::L).margin(5).character_set(CharacterSet::Utf8);
        assert_eq!(round_trip(&codec, "Hello, 世界", 256, &opts), "Hello, 世界");
    }

    #[test]
    fn test_round_trip_shift_jis() {
        let codec = StandardCodec::with_decode_charset(CharacterSet::ShiftJis);
        let opts = EncodeOptions::new().character_set(CharacterSet::ShiftJis);
        assert_eq!(round_trip(&codec, "こんにちは", 256, &opts), "こんにちは");
    }

    #[test]
    fn test_round_trip_latin1_guess() {
        let codec = StandardCodec::new();
        let opts = EncodeOptions::new();
        assert_eq!(round_trip(&codec, "café crème", 256, &opts), "café crème");
    }

    #[test]
    fn test_deterministic() {
        let codec = StandardCodec::new();
        let opts = EncodeOptions::new();
        let a = codec.encode("Deterministic", 120, &opts).unwrap();
        let b = codec.encode("Deterministic", 120, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_rejects_unmappable() {
        let codec = StandardCodec::new();
        let err = codec.encode("日本", 100, &EncodeOptions::new()).unwrap_err();
        assert_eq!(
            err,
            QRError::Encode(EncodeError::UnmappableChar {
                ch: '日',
                charset: CharacterSet::Iso8859_1
            })
        );
    }

    #[test]
    fn test_decode_blank_not_found() {
        let codec = StandardCodec::new();
        let img = PixelImage::from_argb(64, 64, vec![WHITE; 64 * 64]).unwrap();
        let err = codec.decode(&pixels_to_luminance(&img)).unwrap_err();
        assert_eq!(err, QRError::Decode(DecodeError::NotFound));
    }

    #[test]
    fn test_decode_empty_image() {
        let codec = StandardCodec::new();
        let img = PixelImage::from_argb(0, 0, Vec::new()).unwrap();
        let err = codec.decode(&pixels_to_luminance(&img)).unwrap_err();
        assert_eq!(err, QRError::Decode(DecodeError::NotFound));
    }
}
