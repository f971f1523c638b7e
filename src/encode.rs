//! Lossless raster encoding for the portable export payload.

use crate::error::{ExportError, Result};
use crate::rendering::PixelBuffer;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageFormat;
use std::io::Cursor;

/// Encode a buffer as PNG bytes
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    buffer
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ExportError::EncodingFailed(format!("PNG encode: {e}")))?;
    Ok(bytes)
}

/// Decode PNG bytes back into a buffer
pub fn decode_png(bytes: &[u8]) -> Result<PixelBuffer> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| ExportError::EncodingFailed(format!("PNG decode: {e}")))?;
    Ok(image.to_rgba8())
}

/// Base64 data URL for an encoded PNG, suitable for preview display
pub fn to_data_url(png_bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png_bytes))
}
