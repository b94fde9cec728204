//! Error types for sealing and opening images.

use thiserror::Error;

/// Everything that can go wrong between a password and a pixel grid.
#[derive(Debug, Error)]
pub enum StegoError {
    /// Ciphertext length is zero or not a multiple of the AES block size.
    #[error("malformed ciphertext: {0} bytes is not a positive multiple of 16")]
    MalformedCiphertext(usize),
    /// Padding check failed after decryption. Usually a wrong password.
    #[error("incorrect password or corrupted data (invalid padding)")]
    InvalidPadding,
    /// Plaintext passed padding validation but is not UTF-8.
    #[error("decrypted message is not valid UTF-8 text")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),
    /// Pixel data ends before the declared frame does.
    #[error("truncated frame: need {needed} bytes, image holds {available}")]
    TruncatedFrame { needed: usize, available: usize },
    /// Plaintext exceeds the configured ceiling.
    #[error("payload too large: {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },
    /// Ciphertext does not fit the 32-bit length field.
    #[error("frame too large: {0} ciphertext bytes")]
    FrameTooLarge(usize),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StegoError {
    /// True for failures a wrong password can produce. Callers that want to
    /// tell "maybe wrong password" apart from "container is broken" branch here.
    pub fn is_possibly_wrong_password(&self) -> bool {
        matches!(self, Self::InvalidPadding | Self::InvalidEncoding(_))
    }
}

pub type Result<T> = std::result::Result<T, StegoError>;
