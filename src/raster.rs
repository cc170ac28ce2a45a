use image::{DynamicImage, GrayImage, Luma, Pixel, Rgba, RgbaImage};

use crate::error::{try_alloc, QRResult};
use crate::matrix::BitMatrix;

pub const BLACK: u32 = 0xFF00_0000;
pub const WHITE: u32 = 0xFFFF_FFFF;

// Pixel image
//------------------------------------------------------------------------------

/// Grid of 32-bit ARGB samples, rows contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    w: u32,
    h: u32,
    pixels: Vec<u32>,
}

impl PixelImage {
    /// Wraps `pixels`, which must hold exactly `w * h` samples.
    pub fn from_argb(w: u32, h: u32, pixels: Vec<u32>) -> Option<Self> {
        (pixels.len() == w as usize * h as usize).then_some(Self { w, h, pixels })
    }

    pub fn from_dynamic(img: &DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|&Rgba([r, g, b, a])| u32::from_be_bytes([a, r, g, b]))
            .collect();
        Self { w, h, pixels }
    }

    pub fn width(&self) -> u32 {
        self.w
    }

    pub fn height(&self) -> u32 {
        self.h
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.w, self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.w as usize + x as usize]
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Memory held by the samples, used as the cache weight.
    pub fn byte_size(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<u32>()
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.w, self.h, |x, y| {
            let [a, r, g, b] = self.get(x, y).to_be_bytes();
            Rgba([r, g, b, a])
        })
    }
}

// Luminance view
//------------------------------------------------------------------------------

/// 8-bit luminance samples derived from a [`PixelImage`] for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuminanceView(GrayImage);

impl LuminanceView {
    pub fn new(img: GrayImage) -> Self {
        Self(img)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.0.get_pixel(x, y)[0]
    }

    /// Nearest-neighbour enlargement by an integer `factor`.
    pub fn upscale(&self, factor: u32) -> LuminanceView {
        let src = &self.0;
        LuminanceView(GrayImage::from_fn(src.width() * factor, src.height() * factor, |x, y| {
            *src.get_pixel(x / factor, y / factor)
        }))
    }
}

// Conversions
//------------------------------------------------------------------------------

/// Renders set modules black and unset modules white, pixel for cell.
pub fn bitmatrix_to_pixels(bm: &BitMatrix) -> QRResult<PixelImage> {
    let (w, h) = (bm.width(), bm.height());
    let mut pixels = try_alloc(w as usize * h as usize, WHITE)?;
    for y in 0..h {
        let off = y as usize * w as usize;
        for x in 0..w {
            if bm.get(x, y) {
                pixels[off + x as usize] = BLACK;
            }
        }
    }
    Ok(PixelImage { w, h, pixels })
}

/// Rec. 709 luminance of each sample; alpha is ignored.
pub fn pixels_to_luminance(img: &PixelImage) -> LuminanceView {
    let gray = GrayImage::from_fn(img.w, img.h, |x, y| {
        let [_, r, g, b] = img.get(x, y).to_be_bytes();
        let Luma([l]) = Rgba([r, g, b, 255]).to_luma();
        Luma([l])
    });
    LuminanceView(gray)
}

#[cfg(test)]
mod raster_tests {
    use image::{DynamicImage, Rgba, RgbaImage};

    use super::{bitmatrix_to_pixels, pixels_to_luminance, PixelImage, BLACK, WHITE};
    use crate::matrix::BitMatrix;

    #[test]
    fn test_bitmatrix_to_pixels_exact() {
        let mut bm = BitMatrix::new(4, 3).unwrap();
        bm.set(0, 0);
        bm.set(3, 2);
        let img = bitmatrix_to_pixels(&bm).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        for (x, y, set) in bm.iter() {
            assert_eq!(img.get(x, y), if set { BLACK } else { WHITE }, "pixel ({x}, {y})");
        }
        assert_eq!(img.byte_size(), 4 * 3 * 4);
    }

    #[test]
    fn test_luminance_of_sentinels() {
        let img = PixelImage::from_argb(2, 1, vec![BLACK, WHITE]).unwrap();
        let lum = pixels_to_luminance(&img);
        assert_eq!(lum.get(0, 0), 0);
        assert_eq!(lum.get(1, 0), 255);
    }

    #[test]
    fn test_luminance_weights_green_over_blue() {
        let img = PixelImage::from_argb(2, 1, vec![0xFF00_FF00, 0xFF00_00FF]).unwrap();
        let lum = pixels_to_luminance(&img);
        assert!(lum.get(0, 0) > lum.get(1, 0));
    }

    #[test]
    fn test_upscale_nearest() {
        let img = PixelImage::from_argb(2, 1, vec![BLACK, WHITE]).unwrap();
        let big = pixels_to_luminance(&img).upscale(3);
        assert_eq!((big.width(), big.height()), (6, 3));
        for y in 0..3 {
            for x in 0..6 {
                assert_eq!(big.get(x, y), if x < 3 { 0 } else { 255 }, "sample ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_from_argb_checks_len() {
        assert!(PixelImage::from_argb(2, 2, vec![WHITE; 3]).is_none());
    }

    #[test]
    fn test_dynamic_round_trip() {
        let mut rgba = RgbaImage::new(2, 2);
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let img = PixelImage::from_dynamic(&DynamicImage::ImageRgba8(rgba.clone()));
        assert_eq!(img.get(1, 0), 0xFF0A_141E);
        assert_eq!(img.to_rgba_image(), rgba);
    }
}
