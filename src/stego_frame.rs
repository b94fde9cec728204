// Frame layout inside the image, then reshaped into a square RGB grid:
//
//   0   16  salt
//   16  16  IV
//   32   4  ciphertext length (big-endian u32)
//   36   N  ciphertext
//   36+N *  zero padding up to 3 * side * side

use log::debug;

use crate::error::{Result, StegoError};
use crate::stego_crypto::{Sealed, IV_LEN, SALT_LEN};

const LENGTH_BYTES: usize = 4;
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN + LENGTH_BYTES;
pub const BYTES_PER_PIXEL: usize = 3;

/// A `side` x `side` grid of RGB pixels, stored row-major as R, G, B bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    side: u32,
    bytes: Vec<u8>,
}

impl PixelGrid {
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.bytes.chunks_exact(BYTES_PER_PIXEL).map(|p| [p[0], p[1], p[2]])
    }
}

/// Smallest square side whose pixels hold `frame_len` bytes:
/// `ceil(sqrt(ceil(frame_len / 3)))`.
pub fn side_length(frame_len: usize) -> u32 {
    let pixel_count = frame_len.div_ceil(BYTES_PER_PIXEL);
    let mut side = (pixel_count as f64).sqrt() as usize;
    // float sqrt can be off by one either way for large counts
    while side * side < pixel_count {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= pixel_count {
        side -= 1;
    }
    side as u32
}

/// Serialize salt, IV, length and ciphertext, then zero-fill to a square grid.
pub fn pack(salt: &[u8; SALT_LEN], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<PixelGrid> {
    let cipher_len =
        u32::try_from(ciphertext.len()).map_err(|_| StegoError::FrameTooLarge(ciphertext.len()))?;
    let frame_len = HEADER_LEN + ciphertext.len();
    let side = side_length(frame_len);
    let total = BYTES_PER_PIXEL * side as usize * side as usize;

    let mut bytes = Vec::with_capacity(total);
    bytes.extend_from_slice(salt);
    bytes.extend_from_slice(iv);
    bytes.extend_from_slice(&cipher_len.to_be_bytes());
    bytes.extend_from_slice(ciphertext);
    bytes.resize(total, 0);

    debug!(
        "packed {} byte frame into {}x{} grid ({} padding bytes)",
        frame_len,
        side,
        side,
        total - frame_len
    );
    Ok(PixelGrid { side, bytes })
}

/// Inverse of [`pack`] over flattened row-major RGB bytes. Anything past the
/// declared ciphertext is ignored.
pub fn unpack(bytes: &[u8]) -> Result<Sealed> {
    if bytes.len() < HEADER_LEN {
        return Err(StegoError::TruncatedFrame {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    salt.copy_from_slice(&bytes[..SALT_LEN]);
    iv.copy_from_slice(&bytes[SALT_LEN..SALT_LEN + IV_LEN]);
    let len_at = SALT_LEN + IV_LEN;
    let cipher_len = u32::from_be_bytes([
        bytes[len_at],
        bytes[len_at + 1],
        bytes[len_at + 2],
        bytes[len_at + 3],
    ]) as usize;

    let needed = HEADER_LEN.saturating_add(cipher_len);
    if bytes.len() < needed {
        return Err(StegoError::TruncatedFrame {
            needed,
            available: bytes.len(),
        });
    }
    debug!("unpacked frame: {} ciphertext bytes of {} available", cipher_len, bytes.len());
    Ok(Sealed {
        salt,
        iv,
        ciphertext: bytes[HEADER_LEN..needed].to_vec(),
    })
}
