use std::path::Path;

use crate::error::{DecodeError, QRResult};
use crate::raster::PixelImage;

/// Turns an opaque image source into pixels for decoding.
pub trait ImageLoader: Send + Sync {
    type Handle: ?Sized;

    fn load(&self, handle: &Self::Handle) -> QRResult<PixelImage>;
}

// File loader
//------------------------------------------------------------------------------

/// Loads any container format the `image` crate recognises from a path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl ImageLoader for FileLoader {
    type Handle = Path;

    fn load(&self, path: &Path) -> QRResult<PixelImage> {
        let img = image::open(path)
            .map_err(|e| DecodeError::Unreadable(format!("{}: {e}", path.display())))?;
        Ok(PixelImage::from_dynamic(&img))
    }
}

// Memory loader
//------------------------------------------------------------------------------

/// Loads an encoded image held in memory; the format is sniffed from its header.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryLoader;

impl ImageLoader for MemoryLoader {
    type Handle = [u8];

    fn load(&self, bytes: &[u8]) -> QRResult<PixelImage> {
        let img =
            image::load_from_memory(bytes).map_err(|e| DecodeError::Unreadable(e.to_string()))?;
        Ok(PixelImage::from_dynamic(&img))
    }
}

#[cfg(test)]
mod loader_tests {
    use std::io::Cursor;
    use std::path::Path;

    use image::{ImageFormat, Luma};

    use super::{FileLoader, ImageLoader, MemoryLoader};
    use crate::error::{DecodeError, QRError};
    use crate::raster::{BLACK, WHITE};

    fn png_bytes() -> Vec<u8> {
        let img =
            image::GrayImage::from_fn(3, 2, |x, _| if x == 0 { Luma([0]) } else { Luma([255]) });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_memory_loader() {
        let img = MemoryLoader.load(&png_bytes()).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get(0, 1), BLACK);
        assert_eq!(img.get(2, 1), WHITE);
    }

    #[test]
    fn test_memory_loader_garbage() {
        let err = MemoryLoader.load(b"definitely not an image").unwrap_err();
        assert!(matches!(err, QRError::Decode(DecodeError::Unreadable(_))), "{err:?}");
    }

    #[test]
    fn test_file_loader_missing() {
        let err = FileLoader.load(Path::new("no/such/qr.png")).unwrap_err();
        match err {
            QRError::Decode(DecodeError::Unreadable(msg)) => {
                assert!(msg.contains("no/such/qr.png"))
            }
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn test_file_loader() {
        let path = std::env::temp_dir().join(format!("qrcache-loader-{}.png", std::process::id()));
        std::fs::write(&path, png_bytes()).unwrap();
        let img = FileLoader.load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
    }
}
