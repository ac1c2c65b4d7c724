//! Tiled GX pixel decoding and encoding.
//!
//! Every format stores its pixels in fixed-size blocks laid out row-major over the
//! image, with pixels inside a block stored row by row. Images that are not a whole
//! number of blocks are padded; padding pixels are skipped on decode and written as
//! zero on encode.

use byteorder::{BigEndian, ByteOrder};
use enough::Stop;

use crate::bits::{expand3, expand4, expand5, expand6, truncate};
use crate::dither::DitherType;
use crate::cmp::CmpParams;
use crate::error::GxError;
use crate::format::GxFormat;
use crate::pixel::{alpha, gray, pack, unpack, AvgType, OPAQUE_BLACK};

/// Options for the decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub flip_x: bool,
    pub flip_y: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flip_x(mut self, on: bool) -> Self {
        self.flip_x = on;
        self
    }

    pub fn flip_y(mut self, on: bool) -> Self {
        self.flip_y = on;
        self
    }
}

/// Options for the encoders.
///
/// `avg` is used by the intensity formats, `cmp` by CMP. `dither` only matters when a
/// palette is built for an indexed format.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncodeOptions {
    pub flip_x: bool,
    pub flip_y: bool,
    pub avg: AvgType,
    pub dither: DitherType,
    pub cmp: CmpParams,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flip_x(mut self, on: bool) -> Self {
        self.flip_x = on;
        self
    }

    pub fn flip_y(mut self, on: bool) -> Self {
        self.flip_y = on;
        self
    }

    pub fn avg(mut self, avg: AvgType) -> Self {
        self.avg = avg;
        self
    }

    pub fn dither(mut self, dither: DitherType) -> Self {
        self.dither = dither;
        self
    }

    pub fn cmp(mut self, params: CmpParams) -> Self {
        self.cmp = params;
        self
    }
}

pub(crate) fn validate(
    width: usize,
    height: usize,
    input_len: usize,
    output_len: usize,
) -> Result<(), GxError> {
    if width == 0 || height == 0 {
        return Err(GxError::ZeroDimension);
    }
    if input_len == 0 {
        return Err(GxError::EmptyInput);
    }
    if output_len == 0 {
        return Err(GxError::EmptyOutput);
    }
    Ok(())
}

#[inline]
pub(crate) fn check_stop(stop: &dyn Stop) -> Result<(), GxError> {
    stop.check().map_err(|_| GxError::Interrupted)
}

/// Linear index of image pixel (x, y) after applying the flips.
#[inline]
pub(crate) fn flipped_index(
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    flip_x: bool,
    flip_y: bool,
) -> usize {
    let fx = if flip_x { width - 1 - x } else { x };
    let fy = if flip_y { height - 1 - y } else { y };
    fy * width + fx
}

/// Top-left corners of every block covering the image, in storage order.
pub(crate) fn block_origins(
    width: usize,
    height: usize,
    block_width: usize,
    block_height: usize,
) -> impl Iterator<Item = (usize, usize)> {
    (0..height)
        .step_by(block_height)
        .flat_map(move |y| (0..width).step_by(block_width).map(move |x| (x, y)))
}

fn read_unit(input: &[u8], k: usize, bpp: usize) -> Option<u32> {
    match bpp {
        4 => input
            .get(k / 2)
            .map(|&b| u32::from(if k % 2 == 0 { b >> 4 } else { b & 0xF })),
        8 => input.get(k).map(|&b| u32::from(b)),
        _ => input
            .get(2 * k..2 * k + 2)
            .map(|d| u32::from(BigEndian::read_u16(d))),
    }
}

/// Stores unit `k`, returning the end offset of the bytes touched, or `None` when it
/// does not fit.
fn write_unit(output: &mut [u8], k: usize, bpp: usize, v: u32) -> Option<usize> {
    match bpp {
        4 => {
            let b = output.get_mut(k / 2)?;
            let nibble = (v & 0xF) as u8;
            if k % 2 == 0 {
                *b = nibble << 4;
            } else {
                *b |= nibble;
            }
            Some(k / 2 + 1)
        }
        8 => {
            *output.get_mut(k)? = v as u8;
            Some(k + 1)
        }
        _ => {
            let d = output.get_mut(2 * k..2 * k + 2)?;
            BigEndian::write_u16(d, v as u16);
            Some(2 * k + 2)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn decode_units(
    format: GxFormat,
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
    missing: u32,
    convert: impl Fn(u32) -> u32,
) -> Result<usize, GxError> {
    validate(width, height, input.len(), output.len())?;
    let bpp = format.bits_per_pixel();
    let (bw, bh) = (format.block_width(), format.block_height());

    let mut k = 0;
    for (x0, y0) in block_origins(width, height, bw, bh) {
        check_stop(stop)?;
        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                if x < width && y < height {
                    let value = read_unit(input, k, bpp).map_or(missing, &convert);
                    let dst = flipped_index(x, y, width, height, opts.flip_x, opts.flip_y);
                    if let Some(px) = output.get_mut(dst) {
                        *px = value;
                    }
                }
                k += 1;
            }
        }
    }
    Ok(format.mip_size(width, height))
}

#[allow(clippy::too_many_arguments)]
fn encode_units(
    format: GxFormat,
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
    convert: impl Fn(u32) -> u32,
) -> Result<usize, GxError> {
    validate(width, height, input.len(), output.len())?;
    let bpp = format.bits_per_pixel();
    let (bw, bh) = (format.block_width(), format.block_height());

    let mut k = 0;
    let mut written = 0;
    for (x0, y0) in block_origins(width, height, bw, bh) {
        check_stop(stop)?;
        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                let value = if x < width && y < height {
                    let src = flipped_index(x, y, width, height, opts.flip_x, opts.flip_y);
                    input.get(src).map_or(0, |&p| convert(p))
                } else {
                    0
                };
                match write_unit(output, k, bpp, value) {
                    Some(end) => written = end,
                    None => return Ok(written),
                }
                k += 1;
            }
        }
    }
    Ok(written)
}

fn palette_lookup(palette: &[u32], mask: u32) -> impl Fn(u32) -> u32 + '_ {
    move |v| {
        palette
            .get((v & mask) as usize)
            .copied()
            .unwrap_or(OPAQUE_BLACK)
    }
}

fn index_filter(palette_len: usize, mask: u32) -> impl Fn(u32) -> u32 {
    move |i| {
        if (i as usize) < palette_len {
            i & mask
        } else {
            0
        }
    }
}

/// Decode I4: 4-bit intensity, 8x8 blocks.
pub fn decode_i4(
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_units(GxFormat::I4, width, height, input, output, opts, stop, OPAQUE_BLACK, |v| {
        gray(expand4(v), 0xFF)
    })
}

/// Decode I8: 8-bit intensity, 8x4 blocks.
pub fn decode_i8(
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_units(GxFormat::I8, width, height, input, output, opts, stop, OPAQUE_BLACK, |v| {
        gray(v as u8, 0xFF)
    })
}

/// Decode IA4: alpha in the high nibble, intensity in the low one.
pub fn decode_ia4(
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_units(GxFormat::IA4, width, height, input, output, opts, stop, 0, |v| {
        gray(expand4(v), expand4(v >> 4))
    })
}

/// Decode IA8: big-endian alpha then intensity bytes, 4x4 blocks.
pub fn decode_ia8(
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_units(GxFormat::IA8, width, height, input, output, opts, stop, 0, |v| {
        gray(v as u8, (v >> 8) as u8)
    })
}

#[allow(clippy::too_many_arguments)]
fn decode_indexed(
    format: GxFormat,
    mask: u32,
    width: usize,
    height: usize,
    input: &[u8],
    palette: &[u32],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    if palette.is_empty() {
        return Err(GxError::EmptyPalette);
    }
    let lookup = palette_lookup(palette, mask);
    decode_units(format, width, height, input, output, opts, stop, OPAQUE_BLACK, lookup)
}

/// Decode 4-bit palette indices. Out-of-range indices read as opaque black.
pub fn decode_ci4(
    width: usize,
    height: usize,
    input: &[u8],
    palette: &[u32],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_indexed(GxFormat::CI4, 0xF, width, height, input, palette, output, opts, stop)
}

/// Decode 8-bit palette indices.
pub fn decode_ci8(
    width: usize,
    height: usize,
    input: &[u8],
    palette: &[u32],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_indexed(GxFormat::CI8, 0xFF, width, height, input, palette, output, opts, stop)
}

/// Decode CI14X2: the low 14 bits of each big-endian word index the palette.
pub fn decode_ci14x2(
    width: usize,
    height: usize,
    input: &[u8],
    palette: &[u32],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_indexed(GxFormat::CI14X2, 0x3FFF, width, height, input, palette, output, opts, stop)
}

/// Decode big-endian RGB565. Always opaque.
pub fn decode_r5g6b5(
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_units(
        GxFormat::R5G6B5,
        width,
        height,
        input,
        output,
        opts,
        stop,
        OPAQUE_BLACK,
        r5g6b5_to_pixel,
    )
}

/// Decode RGB5A3: opaque RGB555 when the top bit is set, ARGB3444 otherwise.
pub fn decode_rgb5a3(
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    decode_units(GxFormat::RGB5A3, width, height, input, output, opts, stop, 0, rgb5a3_to_pixel)
}

pub(crate) fn rgb5a3_to_pixel(v: u32) -> u32 {
    if v & 0x8000 != 0 {
        pack(expand5(v >> 10), expand5(v >> 5), expand5(v), 0xFF)
    } else {
        pack(expand4(v >> 8), expand4(v >> 4), expand4(v), expand3(v >> 12))
    }
}

pub(crate) fn pixel_to_rgb5a3(p: u32) -> u32 {
    let c = unpack(p);
    if truncate(c.a, 3) == 7 {
        0x8000 | (truncate(c.r, 5) << 10) | (truncate(c.g, 5) << 5) | truncate(c.b, 5)
    } else {
        (truncate(c.a, 3) << 12)
            | (truncate(c.r, 4) << 8)
            | (truncate(c.g, 4) << 4)
            | truncate(c.b, 4)
    }
}

pub(crate) fn r5g6b5_to_pixel(v: u32) -> u32 {
    pack(expand5(v >> 11), expand6(v >> 5), expand5(v), 0xFF)
}

pub(crate) fn pixel_to_r5g6b5(p: u32) -> u32 {
    let c = unpack(p);
    (truncate(c.r, 5) << 11) | (truncate(c.g, 6) << 5) | truncate(c.b, 5)
}

/// RGBA8 blocks hold sixteen AR words followed by sixteen GB words.
pub fn decode_rgba8(
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    validate(width, height, input.len(), output.len())?;
    let (bw, bh) = (GxFormat::RGBA8.block_width(), GxFormat::RGBA8.block_height());

    for (block, (x0, y0)) in block_origins(width, height, bw, bh).enumerate() {
        check_stop(stop)?;
        let base = block * 64;
        for pass in 0..2 {
            for k in 0..bw * bh {
                let (x, y) = (x0 + k % bw, y0 + k / bw);
                if x >= width || y >= height {
                    continue;
                }
                let dst = flipped_index(x, y, width, height, opts.flip_x, opts.flip_y);
                let Some(px) = output.get_mut(dst) else {
                    continue;
                };
                let offset = base + pass * 32 + k * 2;
                let word = input.get(offset..offset + 2).map(BigEndian::read_u16);
                match (pass, word) {
                    (0, Some(ar)) => *px = pack(ar as u8, 0, 0, (ar >> 8) as u8),
                    (0, None) => *px = 0,
                    (_, Some(gb)) => *px |= pack(0, (gb >> 8) as u8, gb as u8, 0),
                    (_, None) => *px = 0,
                }
            }
        }
    }
    Ok(GxFormat::RGBA8.mip_size(width, height))
}

/// Encode I4 using `opts.avg` for intensity.
pub fn encode_i4(
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    let avg = opts.avg;
    encode_units(GxFormat::I4, width, height, input, output, opts, stop, |p| {
        truncate(avg.intensity(p), 4)
    })
}

/// Encode I8 using `opts.avg` for intensity.
pub fn encode_i8(
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    let avg = opts.avg;
    encode_units(GxFormat::I8, width, height, input, output, opts, stop, |p| {
        u32::from(avg.intensity(p))
    })
}

/// Encode IA4, keeping the top four bits of alpha and intensity.
pub fn encode_ia4(
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    let avg = opts.avg;
    encode_units(GxFormat::IA4, width, height, input, output, opts, stop, |p| {
        (truncate(alpha(p), 4) << 4) | truncate(avg.intensity(p), 4)
    })
}

/// Encode IA8.
pub fn encode_ia8(
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    let avg = opts.avg;
    encode_units(GxFormat::IA8, width, height, input, output, opts, stop, |p| {
        (u32::from(alpha(p)) << 8) | u32::from(avg.intensity(p))
    })
}

#[allow(clippy::too_many_arguments)]
fn encode_indexed(
    format: GxFormat,
    mask: u32,
    width: usize,
    height: usize,
    indices: &[u32],
    palette_len: usize,
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    if palette_len == 0 {
        return Err(GxError::EmptyPalette);
    }
    let filter = index_filter(palette_len, mask);
    encode_units(format, width, height, indices, output, opts, stop, filter)
}

/// Encode palette indices. Indices at or past `palette_len` are stored as 0.
pub fn encode_ci4(
    width: usize,
    height: usize,
    indices: &[u32],
    palette_len: usize,
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    encode_indexed(GxFormat::CI4, 0xF, width, height, indices, palette_len, output, opts, stop)
}

/// Encode 8-bit palette indices.
pub fn encode_ci8(
    width: usize,
    height: usize,
    indices: &[u32],
    palette_len: usize,
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    encode_indexed(GxFormat::CI8, 0xFF, width, height, indices, palette_len, output, opts, stop)
}

/// Encode 14-bit palette indices in big-endian words.
pub fn encode_ci14x2(
    width: usize,
    height: usize,
    indices: &[u32],
    palette_len: usize,
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    encode_indexed(
        GxFormat::CI14X2,
        0x3FFF,
        width,
        height,
        indices,
        palette_len,
        output,
        opts,
        stop,
    )
}

/// Encode RGB565, dropping alpha.
pub fn encode_r5g6b5(
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    encode_units(GxFormat::R5G6B5, width, height, input, output, opts, stop, pixel_to_r5g6b5)
}

/// Encode RGB5A3. Alpha of 224 or more selects the opaque layout.
pub fn encode_rgb5a3(
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    encode_units(GxFormat::RGB5A3, width, height, input, output, opts, stop, pixel_to_rgb5a3)
}

/// Encode RGBA8 as an AR pass followed by a GB pass per 4x4 block.
pub fn encode_rgba8(
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    validate(width, height, input.len(), output.len())?;
    let (bw, bh) = (GxFormat::RGBA8.block_width(), GxFormat::RGBA8.block_height());

    let mut written = 0;
    for (block, (x0, y0)) in block_origins(width, height, bw, bh).enumerate() {
        check_stop(stop)?;
        let base = block * 64;
        for pass in 0..2 {
            for k in 0..bw * bh {
                let (x, y) = (x0 + k % bw, y0 + k / bw);
                let c = if x < width && y < height {
                    let src = flipped_index(x, y, width, height, opts.flip_x, opts.flip_y);
                    unpack(input.get(src).copied().unwrap_or(0))
                } else {
                    unpack(0)
                };
                let word = if pass == 0 {
                    (u16::from(c.a) << 8) | u16::from(c.r)
                } else {
                    (u16::from(c.g) << 8) | u16::from(c.b)
                };
                let offset = base + pass * 32 + k * 2;
                let Some(d) = output.get_mut(offset..offset + 2) else {
                    return Ok(written);
                };
                BigEndian::write_u16(d, word);
                written = offset + 2;
            }
        }
    }
    Ok(written)
}

/// Decode any format. `palette` is only read for the indexed formats.
#[allow(clippy::too_many_arguments)]
pub fn decode(
    format: GxFormat,
    width: usize,
    height: usize,
    input: &[u8],
    palette: &[u32],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    match format {
        GxFormat::I4 => decode_i4(width, height, input, output, opts, stop),
        GxFormat::I8 => decode_i8(width, height, input, output, opts, stop),
        GxFormat::IA4 => decode_ia4(width, height, input, output, opts, stop),
        GxFormat::IA8 => decode_ia8(width, height, input, output, opts, stop),
        GxFormat::CI4 => decode_ci4(width, height, input, palette, output, opts, stop),
        GxFormat::CI8 => decode_ci8(width, height, input, palette, output, opts, stop),
        GxFormat::CI14X2 => decode_ci14x2(width, height, input, palette, output, opts, stop),
        GxFormat::R5G6B5 => decode_r5g6b5(width, height, input, output, opts, stop),
        GxFormat::RGB5A3 => decode_rgb5a3(width, height, input, output, opts, stop),
        GxFormat::RGBA8 => decode_rgba8(width, height, input, output, opts, stop),
        GxFormat::CMP => crate::cmp::decode_cmp(width, height, input, output, opts, stop),
    }
}

/// Encode any format. For the indexed formats `input` holds palette indices and
/// `palette_len` is the size of the palette they refer to; it is ignored otherwise.
#[allow(clippy::too_many_arguments)]
pub fn encode(
    format: GxFormat,
    width: usize,
    height: usize,
    input: &[u32],
    palette_len: usize,
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    match format {
        GxFormat::I4 => encode_i4(width, height, input, output, opts, stop),
        GxFormat::I8 => encode_i8(width, height, input, output, opts, stop),
        GxFormat::IA4 => encode_ia4(width, height, input, output, opts, stop),
        GxFormat::IA8 => encode_ia8(width, height, input, output, opts, stop),
        GxFormat::CI4 => encode_ci4(width, height, input, palette_len, output, opts, stop),
        GxFormat::CI8 => encode_ci8(width, height, input, palette_len, output, opts, stop),
        GxFormat::CI14X2 => encode_ci14x2(width, height, input, palette_len, output, opts, stop),
        GxFormat::R5G6B5 => encode_r5g6b5(width, height, input, output, opts, stop),
        GxFormat::RGB5A3 => encode_rgb5a3(width, height, input, output, opts, stop),
        GxFormat::RGBA8 => encode_rgba8(width, height, input, output, opts, stop),
        GxFormat::CMP => crate::cmp::encode_cmp(width, height, input, output, opts, stop),
    }
}
