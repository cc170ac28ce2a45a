use crate::error::{DecodeError, QRResult};
use crate::matrix::BitMatrix;
use crate::raster::LuminanceView;

// Hybrid binarizer
// Steps:
// 1. Divides image into blocks of 8x8 pixels. Blocks on the right and bottom
//    edges are shifted inward, so a few pixels may be counted in two blocks
// 2. Calculates the black point of each block: the average if the block has
//    enough contrast, otherwise half its minimum, lifted to the neighbours'
//    black point when they suggest the block lies inside a dark region
// 3. Thresholds each block by the average black point of the 5x5 blocks
//    around it
// 4. Marks a pixel black if it is less than or equal to the threshold
// Images smaller than 5 blocks in either direction fall back to one global
// threshold taken from the luminance histogram.
//------------------------------------------------------------------------------

const BLOCK_POWER: u32 = 3;
const BLOCK_SZ: u32 = 1 << BLOCK_POWER;
const MIN_DYNAMIC_RANGE: u32 = 24;
const MIN_DIMENSION: u32 = BLOCK_SZ * 5;

const LUMINANCE_SHIFT: u32 = 3;
const LUMINANCE_BUCKETS: usize = 1 << (8 - LUMINANCE_SHIFT);

/// Binarizes `view`; set bits are black.
pub fn binarize(view: &LuminanceView) -> QRResult<BitMatrix> {
    let (w, h) = (view.width(), view.height());
    if w == 0 || h == 0 {
        return Err(DecodeError::NotFound.into());
    }
    if w >= MIN_DIMENSION && h >= MIN_DIMENSION {
        log::trace!("Hybrid thresholding {w}x{h}");
        hybrid(view)
    } else {
        log::trace!("Global thresholding {w}x{h}");
        global(view)
    }
}

fn steps(len: u32) -> usize {
    len.div_ceil(BLOCK_SZ) as usize
}

fn hybrid(view: &LuminanceView) -> QRResult<BitMatrix> {
    let (w, h) = (view.width(), view.height());
    let blk_avg = calculate_block_average(view);
    let thresh = calculate_threshold(view, &blk_avg);

    let wsteps = steps(w);
    let (maxx, maxy) = (w - BLOCK_SZ, h - BLOCK_SZ);
    let mut res = BitMatrix::new(w, h)?;

    for (by, row) in thresh.chunks_exact(wsteps).enumerate() {
        let yoff = ((by as u32) << BLOCK_POWER).min(maxy);
        for (bx, &t) in row.iter().enumerate() {
            let xoff = ((bx as u32) << BLOCK_POWER).min(maxx);
            for y in yoff..yoff + BLOCK_SZ {
                for x in xoff..xoff + BLOCK_SZ {
                    if view.get(x, y) <= t {
                        res.set(x, y);
                    }
                }
            }
        }
    }
    Ok(res)
}

fn calculate_block_average(view: &LuminanceView) -> Vec<u32> {
    let (w, h) = (view.width(), view.height());
    let (wsteps, hsteps) = (steps(w), steps(h));
    let (maxx, maxy) = (w - BLOCK_SZ, h - BLOCK_SZ);
    let mut avg = vec![0u32; wsteps * hsteps];

    for by in 0..hsteps {
        let yoff = ((by as u32) << BLOCK_POWER).min(maxy);
        for bx in 0..wsteps {
            let xoff = ((bx as u32) << BLOCK_POWER).min(maxx);

            let (mut sum, mut mn, mut mx) = (0u32, u8::MAX, u8::MIN);
            for y in yoff..yoff + BLOCK_SZ {
                for x in xoff..xoff + BLOCK_SZ {
                    let p = view.get(x, y);
                    sum += p as u32;
                    mn = mn.min(p);
                    mx = mx.max(p);
                }
            }

            let i = by * wsteps + bx;
            if (mx - mn) as u32 > MIN_DYNAMIC_RANGE {
                // Convert 8x8 sum to average (divide by 64)
                avg[i] = sum >> (2 * BLOCK_POWER);
                continue;
            }

            // Flat block, assume white unless the top/left neighbours say otherwise
            avg[i] = mn as u32 / 2;
            if by > 0 && bx > 0 {
                let ng_avg = (avg[i - wsteps] + 2 * avg[i - 1] + avg[i - wsteps - 1]) / 4;
                if (mn as u32) < ng_avg {
                    avg[i] = ng_avg;
                }
            }
        }
    }
    avg
}

fn calculate_threshold(view: &LuminanceView, avg: &[u32]) -> Vec<u8> {
    let (wsteps, hsteps) = (steps(view.width()), steps(view.height()));
    let (maxx, maxy) = (wsteps - 3, hsteps - 3);
    let mut res = vec![0u8; wsteps * hsteps];

    for y in 0..hsteps {
        let cy = y.clamp(2, maxy);
        for x in 0..wsteps {
            let cx = x.clamp(2, maxx);
            let mut sum = 0u32;
            for ny in cy - 2..=cy + 2 {
                let ni = ny * wsteps + cx;
                sum += avg[ni - 2..=ni + 2].iter().sum::<u32>();
            }
            res[y * wsteps + x] = (sum / 25) as u8;
        }
    }
    res
}

// Global histogram fallback
//------------------------------------------------------------------------------

fn global(view: &LuminanceView) -> QRResult<BitMatrix> {
    let (w, h) = (view.width(), view.height());

    // Sample the middle three fifths of four rows
    let mut buckets = [0u32; LUMINANCE_BUCKETS];
    for row in 1..5 {
        let y = h * row / 5;
        if y >= h {
            continue;
        }
        for x in w / 5..w * 4 / 5 {
            buckets[(view.get(x, y) >> LUMINANCE_SHIFT) as usize] += 1;
        }
    }
    let black_point = estimate_black_point(&buckets).ok_or(DecodeError::NotFound)?;

    let mut res = BitMatrix::new(w, h)?;
    for y in 0..h {
        for x in 0..w {
            if (view.get(x, y) as u32) < black_point {
                res.set(x, y);
            }
        }
    }
    Ok(res)
}

/// Picks the valley between the two dominant histogram peaks. Returns `None`
/// when the peaks are too close to separate dark from light.
fn estimate_black_point(buckets: &[u32; LUMINANCE_BUCKETS]) -> Option<u32> {
    let (first_peak, &max_count) = buckets.iter().enumerate().max_by(|a, b| {
        // Ties go to the lower bucket
        a.1.cmp(b.1).then(b.0.cmp(&a.0))
    })?;

    let mut second_peak = 0;
    let mut second_score = 0u64;
    for (x, &count) in buckets.iter().enumerate() {
        let dist = x.abs_diff(first_peak) as u64;
        let score = count as u64 * dist * dist;
        if score > second_score {
            second_peak = x;
            second_score = score;
        }
    }

    if second_score == 0 {
        return None;
    }

    let (lo, hi) = if first_peak > second_peak {
        (second_peak, first_peak)
    } else {
        (first_peak, second_peak)
    };
    if hi - lo <= LUMINANCE_BUCKETS / 16 {
        return None;
    }

    let mut valley = hi - 1;
    let mut valley_score = -1i64;
    for x in (lo + 1..hi).rev() {
        let from_lo = (x - lo) as i64;
        let score = from_lo * from_lo * (hi - x) as i64 * (max_count - buckets[x]) as i64;
        if score > valley_score {
            valley = x;
            valley_score = score;
        }
    }
    Some((valley as u32) << LUMINANCE_SHIFT)
}
