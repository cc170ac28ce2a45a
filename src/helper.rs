use std::sync::Arc;

use crate::cache::{BitmapCache, CacheKey, LruBitmapCache, TrimLevel, DEFAULT_BUDGET_BYTES};
use crate::codec::{QRCodec, StandardCodec};
use crate::error::{EncodeError, QRResult};
use crate::loader::{FileLoader, ImageLoader};
use crate::logger::{LogLogger, Logger};
use crate::normalize::fold_uri;
use crate::options::EncodeOptions;
use crate::raster::{bitmatrix_to_pixels, pixels_to_luminance, PixelImage};

const TAG: &str = "QRHelper";

// Builder
//------------------------------------------------------------------------------

pub struct QRHelperBuilder {
    codec: Option<Arc<dyn QRCodec>>,
    cache: Option<Arc<dyn BitmapCache>>,
    logger: Option<Arc<dyn Logger>>,
    budget: usize,
}

impl Default for QRHelperBuilder {
    fn default() -> Self {
        Self { codec: None, cache: None, logger: None, budget: DEFAULT_BUDGET_BYTES }
    }
}

impl QRHelperBuilder {
    pub fn codec(mut self, codec: Arc<dyn QRCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Shares `cache` with the helper; overrides [`Self::budget_bytes`].
    pub fn cache(mut self, cache: Arc<dyn BitmapCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Budget of the default cache.
    pub fn budget_bytes(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn build<L: ImageLoader>(self, loader: L) -> QRHelper<L> {
        let budget = self.budget;
        QRHelper {
            codec: self.codec.unwrap_or_else(|| Arc::new(StandardCodec::new())),
            cache: self.cache.unwrap_or_else(|| Arc::new(LruBitmapCache::new(budget))),
            logger: self.logger.unwrap_or_else(|| Arc::new(LogLogger)),
            loader,
        }
    }
}

// Helper
//------------------------------------------------------------------------------

/// Encodes URIs and text into QR images and reads payloads back from images.
///
/// The plain methods never fail: any error is reported once to the injected
/// [`Logger`] and surfaces as `None`. The `try_` variants return the error
/// instead and log nothing.
pub struct QRHelper<L = FileLoader> {
    codec: Arc<dyn QRCodec>,
    cache: Arc<dyn BitmapCache>,
    logger: Arc<dyn Logger>,
    loader: L,
}

impl QRHelper {
    pub fn builder() -> QRHelperBuilder {
        QRHelperBuilder::default()
    }

    pub fn new() -> Self {
        Self::builder().build(FileLoader)
    }
}

impl Default for QRHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ImageLoader> QRHelper<L> {
    /// Same as [`Self::encode_uri_sized`] at the symbol's natural size.
    pub fn encode_uri(&self, uri: &str) -> Option<Arc<PixelImage>> {
        self.encode_uri_sized(uri, 0)
    }

    pub fn encode_uri_sized(&self, uri: &str, size: u32) -> Option<Arc<PixelImage>> {
        self.contain(self.try_encode_uri(uri, size))
    }

    pub fn encode_text(&self, text: &str, size: u32) -> Option<PixelImage> {
        self.contain(self.try_encode_text(text, size))
    }

    pub fn decode(&self, handle: &L::Handle) -> Option<String> {
        self.contain(self.try_decode(handle))
    }

    /// Decodes pixels the caller already holds, bypassing the loader.
    pub fn decode_image(&self, img: &PixelImage) -> Option<String> {
        self.contain(self.try_decode_image(img))
    }

    /// Forwards the host's memory-pressure signal to the cache.
    pub fn trim(&self, level: TrimLevel) {
        self.cache.trim(level);
    }

    /// Upper-cases `uri` and encodes it at level M, serving repeats from the cache.
    pub fn try_encode_uri(&self, uri: &str, size: u32) -> QRResult<Arc<PixelImage>> {
        let opts = EncodeOptions::uri(size);
        let key = CacheKey::new(fold_uri(uri), opts);

        if let Some(img) = self.cache.get(&key) {
            log::debug!("Cache hit for {:?}", key.payload);
            return Ok(img);
        }

        log::debug!("Cache miss for {:?}, encoding...", key.payload);
        let bm = self.codec.encode(&key.payload, size, &opts)?;
        let img = Arc::new(bitmatrix_to_pixels(&bm)?);
        self.cache.put(key, img.clone());
        Ok(img)
    }

    /// Encodes `text` verbatim at level L with a 5 module margin, UTF-8.
    pub fn try_encode_text(&self, text: &str, size: u32) -> QRResult<PixelImage> {
        if size == 0 {
            return Err(EncodeError::InvalidSize(size).into());
        }
        let opts = EncodeOptions::text(size);
        let bm = self.codec.encode(text, size, &opts)?;
        bitmatrix_to_pixels(&bm)
    }

    pub fn try_decode(&self, handle: &L::Handle) -> QRResult<String> {
        let img = self.loader.load(handle)?;
        self.try_decode_image(&img)
    }

    pub fn try_decode_image(&self, img: &PixelImage) -> QRResult<String> {
        self.codec.decode(&pixels_to_luminance(img))
    }

    fn contain<T>(&self, res: QRResult<T>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                self.logger.error(&e, TAG);
                None
            }
        }
    }
}
