// PNG carrier for packed frames. Each frame byte is one colour channel of
// one pixel; the image is the frame, not a cover with hidden bits.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use log::{debug, warn};
use std::io::{BufRead, Cursor, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::stego_frame::PixelGrid;

// Stored pixel order is the frame's byte order, so orientation metadata
// (EXIF and the like) is never applied.
fn load_stored_pixels<R: BufRead + Seek>(reader: ImageReader<R>) -> Result<RgbImage> {
    let img = reader.decode()?.to_rgb8();
    if img.width() != img.height() {
        warn!(
            "image is {}x{}, not square; reading pixels row-major anyway",
            img.width(),
            img.height()
        );
    }
    Ok(img)
}

/// Lossless 8-bit RGB PNG of the grid.
pub fn encode_png(grid: &PixelGrid) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    let encoder = PngEncoder::new(&mut out);
    encoder.write_image(grid.as_bytes(), grid.side(), grid.side(), ExtendedColorType::Rgb8)?;
    let png = out.into_inner();
    debug!("encoded {}x{} grid as {} byte PNG", grid.side(), grid.side(), png.len());
    Ok(png)
}

/// Writes next to `path` and renames into place, so a failed write never
/// leaves a partial image behind.
pub fn write_png(grid: &PixelGrid, path: &Path) -> Result<()> {
    let png = encode_png(grid)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&png)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Decode an in-memory image (PNG or BMP) to row-major 8-bit RGB.
pub fn decode_pixels(bytes: &[u8]) -> Result<RgbImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    load_stored_pixels(reader)
}

pub fn read_pixels(path: &Path) -> Result<RgbImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    load_stored_pixels(reader)
}
