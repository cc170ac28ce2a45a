use std::fmt::{Debug, Display, Error, Formatter};

use crate::options::CharacterSet;

// Encode error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum EncodeError {
    EmptyData,
    InvalidSize(u32),
    DataTooLong,
    DataOverCapacity { used_bits: usize, capacity_bits: usize },
    UnmappableChar { ch: char, charset: CharacterSet },
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::EmptyData => f.write_str("Empty data"),
            Self::InvalidSize(sz) => write!(f, "Invalid size: {sz}"),
            Self::DataTooLong => f.write_str("Data too long for any QR version"),
            Self::DataOverCapacity { used_bits, capacity_bits } => write!(
                f,
                "Data too long: {used_bits} bits needed, {capacity_bits} bits available"
            ),
            Self::UnmappableChar { ch, charset } => {
                write!(f, "Character {ch:?} cannot be represented in {charset}")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

// Decode error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DecodeError {
    /// No symbol located, including in images of zero area.
    NotFound,
    Corrupt(String),
    InvalidText(CharacterSet),
    Unreadable(String),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::NotFound => f.write_str("Symbol not found"),
            Self::Corrupt(msg) => write!(f, "Symbol could not be decoded: {msg}"),
            Self::InvalidText(charset) => write!(f, "Payload is not valid {charset}"),
            Self::Unreadable(msg) => write!(f, "Image unreadable: {msg}"),
        }
    }
}

impl std::error::Error for DecodeError {}

// Resource error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ResourceError {
    Allocation { bytes: Option<usize> },
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::Allocation { bytes: Some(b) } => write!(f, "Failed to allocate {b} bytes"),
            Self::Allocation { bytes: None } => f.write_str("Allocation size overflows usize"),
        }
    }
}

impl std::error::Error for ResourceError {}

// Error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum QRError {
    Encode(EncodeError),
    Decode(DecodeError),
    Resource(ResourceError),
}

impl Display for QRError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::Encode(e) => write!(f, "Encode failed: {e}"),
            Self::Decode(e) => write!(f, "Decode failed: {e}"),
            Self::Resource(e) => write!(f, "Out of resources: {e}"),
        }
    }
}

impl std::error::Error for QRError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Resource(e) => Some(e),
        }
    }
}

impl From<EncodeError> for QRError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<DecodeError> for QRError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<ResourceError> for QRError {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

pub type QRResult<T> = Result<T, QRError>;

/// Reserves exactly `len` elements, reporting failure instead of aborting.
pub(crate) fn try_alloc<T: Clone>(len: usize, fill: T) -> QRResult<Vec<T>> {
    let bytes = len.checked_mul(std::mem::size_of::<T>());
    let mut buf = Vec::new();
    match bytes {
        Some(b) => buf
            .try_reserve_exact(len)
            .map_err(|_| ResourceError::Allocation { bytes: Some(b) })?,
        None => return Err(ResourceError::Allocation { bytes: None }.into()),
    }
    buf.resize(len, fill);
    Ok(buf)
}

#[cfg(test)]
mod error_tests {
    use super::{try_alloc, DecodeError, EncodeError, QRError, ResourceError};
    use crate::options::CharacterSet;

    #[test]
    fn test_display() {
        let err: QRError =
            EncodeError::UnmappableChar { ch: '世', charset: CharacterSet::Iso8859_1 }.into();
        assert_eq!(
            err.to_string(),
            "Encode failed: Character '世' cannot be represented in ISO-8859-1"
        );

        let err: QRError = DecodeError::NotFound.into();
        assert_eq!(err.to_string(), "Decode failed: Symbol not found");
    }

    #[test]
    fn test_try_alloc() {
        let buf = try_alloc(16, 0u32).unwrap();
        assert_eq!(buf.len(), 16);

        let err = try_alloc(usize::MAX, 0u32).unwrap_err();
        assert_eq!(err, QRError::Resource(ResourceError::Allocation { bytes: None }));
    }
}
