use std::panic::{self, AssertUnwindSafe};

use qirust::qrcode::{Mask, QrCodeEcc, Version};
use rqrr::{BitGrid, MetaData, PreparedImage};

use super::binarize::binarize;
use super::writer::encode_bytes;
use crate::error::{DecodeError, QRResult};
use crate::matrix::BitMatrix;
use crate::options::{CharacterSet, DEFAULT_MARGIN};
use crate::raster::LuminanceView;

/// Views whose shorter side is below this are enlarged before detection: a
/// version 40 symbol with its quiet zone at 3 pixels per module.
const MIN_DECODE_SIDE: u32 = 3 * (177 + 2 * DEFAULT_MARGIN);
const MAX_UPSCALE: u32 = 8;
const MAX_UPSCALED_PIXELS: u64 = 16 << 20;

/// Locates a symbol in `view` and returns its payload.
///
/// Byte segments are decoded under the character set their ECI designator
/// names, else under `charset` when given, else as UTF-8 with an ISO-8859-1
/// fallback. Every detected grid is tried in turn; the first that decodes wins.
pub fn read(view: &LuminanceView, charset: Option<CharacterSet>) -> QRResult<String> {
    let (w, h) = (view.width(), view.height());
    if w == 0 || h == 0 {
        return Err(DecodeError::NotFound.into());
    }

    let factor = upscale_factor(w, h);
    let enlarged;
    let view = if factor > 1 {
        log::debug!("Enlarging {w}x{h} image {factor}x...");
        enlarged = view.upscale(factor);
        &enlarged
    } else {
        view
    };

    log::debug!("Binarizing {}x{} image...", view.width(), view.height());
    let bits = binarize(view)?;

    let (grid, meta, payload) = contain_panic(|| detect_and_decode(&bits))?;
    match announced_charset(&grid, &meta, &payload).or(charset) {
        Some(cs) => Ok(cs.decode(&payload)?),
        None => Ok(CharacterSet::guess_decode(&payload)),
    }
}

/// Runs `f`, turning a panic raised inside it into [`DecodeError::Corrupt`].
///
/// rqrr asserts on some degenerate grid geometry.
fn contain_panic<T>(f: impl FnOnce() -> QRResult<T>) -> QRResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|cause| {
        let msg = cause
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| cause.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "unknown panic".to_string());
        log::warn!("Decoder panicked: {msg}");
        Err(DecodeError::Corrupt(format!("decoder panicked: {msg}")).into())
    })
}

/// Integer enlargement that brings the shorter side up to [`MIN_DECODE_SIDE`],
/// bounded by [`MAX_UPSCALE`] and by the enlarged area.
fn upscale_factor(w: u32, h: u32) -> u32 {
    let mut factor = MIN_DECODE_SIDE.div_ceil(w.min(h)).clamp(1, MAX_UPSCALE);
    let area = u64::from(w) * u64::from(h);
    while factor > 1 && area * u64::from(factor * factor) > MAX_UPSCALED_PIXELS {
        factor -= 1;
    }
    factor
}

fn detect_and_decode(bits: &BitMatrix) -> QRResult<(rqrr::SimpleGrid, MetaData, Vec<u8>)> {
    log::debug!("Detecting grids...");
    let mut img = PreparedImage::prepare_from_bitmap(
        bits.width() as usize,
        bits.height() as usize,
        |x, y| bits.get(x as u32, y as u32),
    );
    let grids = img.detect_grids();
    if grids.is_empty() {
        return Err(DecodeError::NotFound.into());
    }

    let mut last_err = None;
    for (i, grid) in grids.into_iter().enumerate() {
        let mut payload = Vec::new();
        match grid.decode_to(&mut payload) {
            Ok(meta) => {
                log::debug!("Grid {i} decoded, {} payload bytes", payload.len());
                let snapshot = rqrr::SimpleGrid::from_func(grid.grid.size(), |x, y| grid.grid.bit(y, x));
                return Ok((snapshot, meta, payload));
            }
            Err(e) => {
                log::debug!("Grid {i} failed: {e}");
                last_err = Some(e);
            }
        }
    }

    let msg = last_err.map(|e| e.to_string()).unwrap_or_default();
    Err(DecodeError::Corrupt(msg).into())
}

// ECI recovery
// rqrr parses ECI designators but does not report them. Each candidate
// designator is re-encoded together with the decoded bytes at the decoded
// version, level and mask; the candidate whose modules match the grid is the
// one the symbol carries. A wrong designator changes a whole Reed-Solomon
// block, while the right one differs only where the image is damaged.
//------------------------------------------------------------------------------

/// Share of modules, in tenths, that may disagree before no candidate is accepted.
const MAX_MISMATCH_TENTHS: usize = 1;

fn announced_charset(grid: &dyn BitGrid, meta: &MetaData, payload: &[u8]) -> Option<CharacterSet> {
    // Every set agrees on ASCII
    if payload.is_ascii() {
        return None;
    }

    let version = u8::try_from(meta.version.0).ok().filter(|v| (1..=40).contains(v))?;
    let version = Version::new(version);
    let mask = u8::try_from(meta.mask).ok().filter(|m| *m <= 7).map(Mask::new)?;
    // Format bits order the levels M, L, H, Q
    let ecl = match meta.ecc_level {
        0 => QrCodeEcc::Medium,
        1 => QrCodeEcc::Low,
        2 => QrCodeEcc::High,
        3 => QrCodeEcc::Quartile,
        _ => return None,
    };

    let side = grid.size();
    let mut outbuffer = vec![0u8; Version::MAX.buffer_len()];
    let mut tempbuffer = vec![0u8; Version::MAX.buffer_len()];
    let mut best: Option<(usize, CharacterSet)> = None;

    for cs in CharacterSet::ALL {
        let versions = (version, version);
        let Ok(qr) =
            encode_bytes(payload, cs, &mut outbuffer, &mut tempbuffer, ecl, versions, Some(mask))
        else {
            continue;
        };
        if qr.size() as usize != side {
            continue;
        }
        let mismatches = (0..side)
            .flat_map(|y| (0..side).map(move |x| (x, y)))
            .filter(|&(x, y)| qr.get_module(x as i32, y as i32) != grid.bit(y, x))
            .count();
        log::trace!("ECI {} candidate differs in {mismatches} modules", cs.eci());
        if best.map_or(true, |(m, _)| mismatches < m) {
            best = Some((mismatches, cs));
        }
    }

    best.filter(|&(m, _)| m * 10 <= side * side * MAX_MISMATCH_TENTHS).map(|(_, cs)| cs)
}
