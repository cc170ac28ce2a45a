use qirust::qrcode::{DataTooLong, Mask, QrCode, QrCodeEcc, QrSegment, Version};

use crate::error::{EncodeError, QRResult, ResourceError};
use crate::matrix::BitMatrix;
use crate::options::{CharacterSet, EncodeOptions};

impl From<DataTooLong> for EncodeError {
    fn from(e: DataTooLong) -> Self {
        match e {
            DataTooLong::SegmentTooLong => EncodeError::DataTooLong,
            DataTooLong::DataOverCapacity(used_bits, capacity_bits) => {
                EncodeError::DataOverCapacity { used_bits, capacity_bits }
            }
        }
    }
}

/// Builds the smallest symbol that holds `text` at the requested level and
/// renders it, quiet zone included, into a matrix of side `max(size, natural)`.
///
/// Text made only of digits or of the 45-character alphanumeric set is
/// encoded in the denser numeric/alphanumeric modes; anything else goes into a
/// single byte segment serialized under `opts.character_set` and announced by
/// an ECI designator.
pub fn write(text: &str, size: u32, opts: &EncodeOptions) -> QRResult<BitMatrix> {
    if text.is_empty() {
        return Err(EncodeError::EmptyData.into());
    }

    let ecl: QrCodeEcc = opts.ec_level.into();
    let mut outbuffer = vec![0u8; Version::MAX.buffer_len()];
    let mut tempbuffer = vec![0u8; Version::MAX.buffer_len()];

    let qr = if QrSegment::is_alphanumeric(text) {
        log::trace!("Encoding {} chars in numeric/alphanumeric mode", text.len());
        QrCode::encode_text(
            text,
            &mut tempbuffer,
            &mut outbuffer,
            ecl,
            Version::MIN,
            Version::MAX,
            None,
            false,
        )
    } else {
        let bytes = opts.character_set.encode(text)?;
        log::trace!("Encoding {} bytes in byte mode ({})", bytes.len(), opts.character_set);
        encode_bytes(
            &bytes,
            opts.character_set,
            &mut outbuffer,
            &mut tempbuffer,
            ecl,
            (Version::MIN, Version::MAX),
            None,
        )
    }
    .map_err(EncodeError::from)?;

    render(&qr, size, opts.margin)
}

/// Builds a symbol holding an ECI designator for `charset` followed by one
/// byte segment carrying `bytes`.
///
/// The smallest version within `versions` is chosen; ECC level is never boosted.
pub(crate) fn encode_bytes<'a>(
    bytes: &[u8],
    charset: CharacterSet,
    outbuffer: &'a mut [u8],
    tempbuffer: &mut [u8],
    ecl: QrCodeEcc,
    versions: (Version, Version),
    mask: Option<Mask>,
) -> Result<QrCode<'a>, DataTooLong> {
    let mut eci_buf = [0u8; 3];
    let segs = [QrSegment::make_eci(charset.eci(), &mut eci_buf), QrSegment::make_bytes(bytes)];
    let (datalen, ecl, version) =
        QrCode::encode_segments_to_codewords(&segs, outbuffer, ecl, versions.0, versions.1, false)?;
    Ok(QrCode::encode_codewords(outbuffer, datalen, tempbuffer, ecl, version, mask))
}

/// Scales the symbol by the largest integer factor that fits `size` and
/// centres it; leftover pixels widen the quiet zone.
fn render(qr: &QrCode, size: u32, margin: u32) -> QRResult<BitMatrix> {
    let modules = qr.size() as u32;
    let natural = margin
        .checked_mul(2)
        .and_then(|m| m.checked_add(modules))
        .ok_or(ResourceError::Allocation { bytes: None })?;

    let side = size.max(natural);
    let scale = side / natural;
    let pad = (side - modules * scale) / 2;

    let mut out = BitMatrix::square(side)?;
    for y in 0..modules {
        for x in 0..modules {
            if qr.get_module(x as i32, y as i32) {
                out.set_region(pad + x * scale, pad + y * scale, scale, scale);
            }
        }
    }
    Ok(out)
}
