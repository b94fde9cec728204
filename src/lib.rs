//! Hide a password-encrypted message inside a generated PNG.
//!
//! The message is encrypted with AES-256-CBC under a PBKDF2-SHA256 key, then
//! the salt, IV, length and ciphertext are laid out as the raw RGB bytes of the
//! smallest square image that holds them.

pub mod config;
pub mod error;
pub mod stego;
pub mod stego_crypto;
pub mod stego_frame;

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use config::{Settings, DEFAULT_ITERATIONS, DEFAULT_MAX_PAYLOAD_LEN};
pub use error::{Result, StegoError};
pub use stego_crypto::{decode_text, decrypt, derive_key, encrypt, Sealed};
pub use stego_frame::{pack, side_length, unpack, PixelGrid, HEADER_LEN};

#[derive(Debug, Serialize, Deserialize)]
pub struct StegoEncodeResult {
    pub ok: bool,
    pub path: Option<String>,
    pub size: Option<u32>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StegoDecodeResult {
    pub ok: bool,
    pub payload: Option<String>,
    pub error: Option<String>,
}

/// Encrypt `message` and pack it into a square pixel grid.
pub fn seal(message: &[u8], password: &[u8], settings: &Settings) -> Result<PixelGrid> {
    if message.len() > settings.max_payload_len {
        return Err(StegoError::PayloadTooLarge {
            len: message.len(),
            max: settings.max_payload_len,
        });
    }
    let sealed = encrypt(message, password, settings.iterations);
    debug!(
        "sealed {} byte message: salt={} iv={}",
        message.len(),
        hex::encode(sealed.salt),
        hex::encode(sealed.iv)
    );
    pack(&sealed.salt, &sealed.iv, &sealed.ciphertext)
}

/// Unpack row-major RGB bytes and decrypt the frame they carry.
pub fn open(pixels: &[u8], password: &[u8], settings: &Settings) -> Result<Vec<u8>> {
    let sealed = unpack(pixels)?;
    debug!("opening frame: salt={} iv={}", hex::encode(sealed.salt), hex::encode(sealed.iv));
    sealed.open(password, settings.iterations)
}

/// Returns the square side length and the PNG bytes.
pub fn encrypt_to_png(message: &[u8], password: &[u8], settings: &Settings) -> Result<(u32, Vec<u8>)> {
    let grid = seal(message, password, settings)?;
    Ok((grid.side(), stego::encode_png(&grid)?))
}

pub fn decrypt_from_png(png: &[u8], password: &[u8], settings: &Settings) -> Result<Vec<u8>> {
    let img = stego::decode_pixels(png)?;
    open(img.as_raw(), password, settings)
}

/// Write the sealed image to `output`; returns its side length.
pub fn encrypt_to_image(
    message: &[u8],
    password: &[u8],
    output: &Path,
    settings: &Settings,
) -> Result<u32> {
    let grid = seal(message, password, settings)?;
    stego::write_png(&grid, output)?;
    Ok(grid.side())
}

pub fn decrypt_from_image(path: &Path, password: &[u8], settings: &Settings) -> Result<Vec<u8>> {
    let img = stego::read_pixels(path)?;
    open(img.as_raw(), password, settings)
}

/// [`decrypt_from_image`] plus UTF-8 decoding.
pub fn decrypt_text_from_image(path: &Path, password: &[u8], settings: &Settings) -> Result<String> {
    decode_text(decrypt_from_image(path, password, settings)?)
}
