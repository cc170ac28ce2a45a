//! Memoizing bitmap cache for the URI encode path.
//!
//! Entries are weighted by the byte size of their image and evicted in
//! least-recently-used order once the byte budget would be exceeded. The host
//! can shed memory at any time through [`BitmapCache::trim`].

use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::options::EncodeOptions;
use crate::raster::PixelImage;

/// Budget used when none is configured.
pub const DEFAULT_BUDGET_BYTES: usize = 4 << 20;

// Cache key
//------------------------------------------------------------------------------

/// Payload as handed to the codec, plus every option that shaped the image.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct CacheKey {
    pub payload: String,
    pub options: EncodeOptions,
}

impl CacheKey {
    pub fn new(payload: impl Into<String>, options: EncodeOptions) -> Self {
        Self { payload: payload.into(), options }
    }
}

// Trim level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TrimLevel {
    /// Drop the least recently used half.
    Moderate,
    /// Drop everything.
    Severe,
}

// Cache trait
//------------------------------------------------------------------------------

pub trait BitmapCache: Send + Sync {
    /// Returns the cached image and marks it most recently used.
    fn get(&self, key: &CacheKey) -> Option<Arc<PixelImage>>;

    fn put(&self, key: CacheKey, img: Arc<PixelImage>);

    fn trim(&self, level: TrimLevel);
}

// LRU cache
//------------------------------------------------------------------------------

struct Inner {
    entries: LruCache<CacheKey, Arc<PixelImage>>,
    resident: usize,
}

impl Inner {
    fn evict_lru(&mut self) -> bool {
        match self.entries.pop_lru() {
            Some((key, img)) => {
                self.resident -= img.byte_size();
                log::debug!("Evicted {:?} ({} bytes)", key.payload, img.byte_size());
                true
            }
            None => false,
        }
    }
}

/// Byte-bounded LRU cache behind a single lock.
pub struct LruBitmapCache {
    inner: Mutex<Inner>,
    budget: usize,
}

impl Default for LruBitmapCache {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_BYTES)
    }
}

impl LruBitmapCache {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { entries: LruCache::unbounded(), resident: 0 }),
            budget: budget_bytes,
        }
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget
    }

    pub fn resident_bytes(&self) -> usize {
        self.inner.lock().resident
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test that leaves recency untouched.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains(key)
    }
}

impl BitmapCache for LruBitmapCache {
    fn get(&self, key: &CacheKey) -> Option<Arc<PixelImage>> {
        self.inner.lock().entries.get(key).cloned()
    }

    fn put(&self, key: CacheKey, img: Arc<PixelImage>) {
        let weight = img.byte_size();
        let mut inner = self.inner.lock();

        if let Some(old) = inner.entries.pop(&key) {
            inner.resident -= old.byte_size();
        }
        if weight > self.budget {
            log::debug!(
                "Not caching {:?}: {weight} bytes exceeds budget {}",
                key.payload,
                self.budget
            );
            return;
        }
        while inner.resident + weight > self.budget && inner.evict_lru() {}

        inner.resident += weight;
        inner.entries.put(key, img);
    }

    fn trim(&self, level: TrimLevel) {
        let mut inner = self.inner.lock();
        let keep = match level {
            TrimLevel::Moderate => inner.entries.len() / 2,
            TrimLevel::Severe => 0,
        };
        log::debug!("Trimming cache ({level:?}): {} -> {keep} entries", inner.entries.len());
        while inner.entries.len() > keep && inner.evict_lru() {}
    }
}

#[cfg(test)]
mod cache_tests {
    use std::sync::Arc;

    use super::{BitmapCache, CacheKey, LruBitmapCache, TrimLevel};
    use crate::options::EncodeOptions;
    use crate::raster::{PixelImage, WHITE};

    fn image(side: u32) -> Arc<PixelImage> {
        Arc::new(PixelImage::from_argb(side, side, vec![WHITE; (side * side) as usize]).unwrap())
    }

    fn key(payload: &str) -> CacheKey {
        CacheKey::new(payload, EncodeOptions::uri(0))
    }

    #[test]
    fn test_get_after_put() {
        let cache = LruBitmapCache::new(1 << 20);
        let img = image(10);
        cache.put(key("A"), img.clone());
        assert!(Arc::ptr_eq(&cache.get(&key("A")).unwrap(), &img));
        assert!(cache.get(&key("B")).is_none());
        assert_eq!(cache.resident_bytes(), 400);
    }

    #[test]
    fn test_options_are_part_of_key() {
        let cache = LruBitmapCache::new(1 << 20);
        cache.put(CacheKey::new("A", EncodeOptions::uri(0)), image(10));
        assert!(cache.get(&CacheKey::new("A", EncodeOptions::uri(100))).is_none());
        assert!(cache.get(&CacheKey::new("A", EncodeOptions::text(0))).is_none());
    }

    #[test]
    fn test_replace_updates_weight() {
        let cache = LruBitmapCache::new(1 << 20);
        cache.put(key("A"), image(10));
        cache.put(key("A"), image(20));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.resident_bytes(), 1600);
    }

    #[test]
    fn test_evicts_lru_within_budget() {
        // Each 10x10 image weighs 400 bytes
        let cache = LruBitmapCache::new(1000);
        cache.put(key("A"), image(10));
        cache.put(key("B"), image(10));
        assert!(cache.get(&key("A")).is_some()); // B is now the oldest
        cache.put(key("C"), image(10));
        assert!(cache.contains(&key("A")));
        assert!(!cache.contains(&key("B")));
        assert!(cache.contains(&key("C")));
        assert!(cache.resident_bytes() <= 1000);
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let cache = LruBitmapCache::new(1000);
        cache.put(key("A"), image(10));
        cache.put(key("BIG"), image(20));
        assert!(!cache.contains(&key("BIG")));
        assert!(cache.contains(&key("A")));
    }

    #[test]
    fn test_trim_moderate_odd() {
        let cache = LruBitmapCache::new(1 << 20);
        for k in ["1", "2", "3", "4", "5"] {
            cache.put(key(k), image(4));
        }
        cache.trim(TrimLevel::Moderate);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key("4")) && cache.contains(&key("5")));
        assert_eq!(cache.resident_bytes(), 2 * 64);
    }

    #[test]
    fn test_trim_severe() {
        let cache = LruBitmapCache::new(1 << 20);
        cache.put(key("A"), image(4));
        cache.put(key("B"), image(4));
        cache.trim(TrimLevel::Severe);
        assert!(cache.is_empty());
        assert_eq!(cache.resident_bytes(), 0);
        assert!(cache.get(&key("A")).is_none());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = LruBitmapCache::new(64 * 400);
        std::thread::scope(|s| {
            for t in 0..8 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..200 {
                        let k = key(&format!("{}", (t * 7 + i) % 32));
                        match cache.get(&k) {
                            Some(img) => assert_eq!(img.dimensions(), (10, 10)),
                            None => cache.put(k, image(10)),
                        }
                        if i % 50 == 0 {
                            cache.trim(TrimLevel::Moderate);
                        }
                    }
                });
            }
        });
        assert!(cache.resident_bytes() <= cache.budget_bytes());
        assert_eq!(cache.resident_bytes(), cache.len() * 400);
    }
}
