//! Palette transcoding between packed pixels and the 16-bit TXTR palette formats.

use byteorder::{BigEndian, ByteOrder};

use crate::codec::{pixel_to_r5g6b5, pixel_to_rgb5a3, r5g6b5_to_pixel, rgb5a3_to_pixel};
use crate::error::GxError;
use crate::format::PaletteFormat;
use crate::pixel::{alpha, gray, AvgType};

fn entry_to_pixel(format: PaletteFormat, v: u32) -> u32 {
    match format {
        PaletteFormat::IA8 => gray(v as u8, (v >> 8) as u8),
        PaletteFormat::R5G6B5 => r5g6b5_to_pixel(v),
        PaletteFormat::RGB5A3 => rgb5a3_to_pixel(v),
    }
}

fn pixel_to_entry(format: PaletteFormat, p: u32, avg: AvgType) -> u16 {
    let v = match format {
        PaletteFormat::IA8 => (u32::from(alpha(p)) << 8) | u32::from(avg.intensity(p)),
        PaletteFormat::R5G6B5 => pixel_to_r5g6b5(p),
        PaletteFormat::RGB5A3 => pixel_to_rgb5a3(p),
    };
    v as u16
}

/// Decode a palette of big-endian 16-bit entries.
pub fn decode_palette(format: PaletteFormat, bytes: &[u8]) -> Result<Vec<u32>, GxError> {
    if bytes.is_empty() {
        return Err(GxError::EmptyInput);
    }
    if bytes.len() % 2 != 0 {
        return Err(GxError::OddPaletteLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|e| entry_to_pixel(format, u32::from(BigEndian::read_u16(e))))
        .collect())
}

/// Encode a palette into big-endian 16-bit entries. `avg` collapses colors to
/// intensity for IA8.
pub fn encode_palette(
    format: PaletteFormat,
    colors: &[u32],
    avg: AvgType,
) -> Result<Vec<u8>, GxError> {
    if colors.is_empty() {
        return Err(GxError::EmptyPalette);
    }
    let mut out = vec![0u8; colors.len() * 2];
    for (dst, &c) in out.chunks_exact_mut(2).zip(colors) {
        BigEndian::write_u16(dst, pixel_to_entry(format, c, avg));
    }
    Ok(out)
}
