//! # qrcache
//!
//! QR code helper for applications that show and scan codes: encode URIs and
//! text into raster images, read payloads back from images, and keep recently
//! rendered URI codes in a memory-bounded cache the host can trim.
//!
//! ## Features
//!
//! - **URI encoding**: URIs are upper-cased before encoding so that typical
//!   `scheme:HEX` payloads use the dense alphanumeric mode, then rendered at
//!   error correction level M and memoized
//! - **Text encoding**: arbitrary text as UTF-8 at level L with a 5 module quiet zone
//! - **Decoding**: hybrid binarization followed by grid detection and
//!   Reed-Solomon correction; byte payloads follow the ECI designator the
//!   encoder writes, and symbols drawn at one pixel per module are enlarged
//!   before detection
//! - **Bitmap cache**: byte-budgeted LRU keyed on payload and options, with
//!   moderate and severe trim levels
//! - **Failure containment**: public operations return `None` on failure and
//!   report the cause to an injected [`Logger`]
//!
//! ## Quick Start
//!
//! ```rust
//! use qrcache::{MemoryLoader, QRHelper};
//!
//! let helper = QRHelper::builder().build(MemoryLoader);
//!
//! let img = helper.encode_uri_sized("openpgp4fpr:1234abcd", 240).unwrap();
//! assert_eq!(img.dimensions(), (240, 240));
//!
//! let text = helper.decode_image(&img).unwrap();
//! assert_eq!(text, "OPENPGP4FPR:1234ABCD");
//! ```
//!
//! ### Reacting to memory pressure
//!
//! ```rust
//! use qrcache::{QRHelper, TrimLevel};
//!
//! let helper = QRHelper::new();
//! let _ = helper.encode_uri("openpgp4fpr:1234abcd");
//! helper.trim(TrimLevel::Severe);
//! ```

pub mod cache;
pub mod codec;
pub mod error;
pub mod helper;
pub mod loader;
pub mod logger;
pub mod matrix;
pub mod normalize;
pub mod options;
pub mod raster;

pub use cache::{BitmapCache, CacheKey, LruBitmapCache, TrimLevel, DEFAULT_BUDGET_BYTES};
pub use codec::{QRCodec, StandardCodec};
pub use error::{DecodeError, EncodeError, QRError, QRResult, ResourceError};
pub use helper::{QRHelper, QRHelperBuilder};
pub use loader::{FileLoader, ImageLoader, MemoryLoader};
pub use logger::{LogLogger, Logger};
pub use matrix::BitMatrix;
pub use normalize::fold_uri;
pub use options::{CharacterSet, ECLevel, EncodeOptions};
pub use raster::{bitmatrix_to_pixels, pixels_to_luminance, LuminanceView, PixelImage};
