//! CMP: GX block-compressed textures.
//!
//! An 8x8 CMP block holds four DXT1 sub-blocks in the order top-left, top-right,
//! bottom-left, bottom-right. GX stores each sub-block's colors big-endian and packs the
//! 2-bit indices of a row with the leftmost pixel in the high bits, so a sub-block is
//! converted to standard DXT1 before `texpresso` (a libsquish port) compresses or
//! decompresses it.

use enough::Stop;
use texpresso::{Algorithm, Format, Params, COLOUR_WEIGHTS_UNIFORM};

use crate::codec::{block_origins, check_stop, flipped_index, validate, DecodeOptions, EncodeOptions};
use crate::error::GxError;
use crate::format::GxFormat;
use crate::pixel::{pack, unpack};

const SUB_BLOCKS: [(usize, usize); 4] = [(0, 0), (4, 0), (0, 4), (4, 4)];

/// DXT1 endpoint search, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CmpFit {
    /// Extremes along the principal axis.
    Range,
    #[default]
    Cluster,
    /// Cluster fit repeated until the ordering settles. Slowest, best quality.
    IterativeCluster,
}

/// Sub-block compressor settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CmpParams {
    pub fit: CmpFit,
    /// Scale each pixel's influence on the endpoint fit by its alpha.
    pub weigh_by_alpha: bool,
    /// Per-channel R, G, B error weights. `None` weighs channels equally.
    pub metric: Option<[f32; 3]>,
}

impl CmpParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(mut self, fit: CmpFit) -> Self {
        self.fit = fit;
        self
    }

    pub fn weigh_by_alpha(mut self, on: bool) -> Self {
        self.weigh_by_alpha = on;
        self
    }

    pub fn metric(mut self, metric: [f32; 3]) -> Self {
        self.metric = Some(metric);
        self
    }

    fn squish(&self) -> Params {
        Params {
            algorithm: match self.fit {
                CmpFit::Range => Algorithm::RangeFit,
                CmpFit::Cluster => Algorithm::ClusterFit,
                CmpFit::IterativeCluster => Algorithm::IterativeClusterFit,
            },
            weights: self.metric.unwrap_or(COLOUR_WEIGHTS_UNIFORM),
            weigh_colour_by_alpha: self.weigh_by_alpha,
        }
    }
}

/// Reverse the order of the four 2-bit groups in a byte. Self-inverse.
#[inline]
pub fn swizzle(x: u8) -> u8 {
    ((x & 0x3) << 6) | ((x & 0xC) << 2) | ((x & 0x30) >> 2) | ((x & 0xC0) >> 6)
}

/// Converts a sub-block between the GX and DXT1 layouts. The conversion is its own
/// inverse.
fn convert_sub_block(src: &[u8]) -> [u8; 8] {
    [
        src[1],
        src[0],
        src[3],
        src[2],
        swizzle(src[4]),
        swizzle(src[5]),
        swizzle(src[6]),
        swizzle(src[7]),
    ]
}

/// 4x4 RGBA bytes, row-major.
fn decode_sub_block(unit: &[u8]) -> [u8; 64] {
    let mut rgba = [0u8; 64];
    Format::Bc1.decompress(&convert_sub_block(unit), 4, 4, &mut rgba);
    rgba
}

fn encode_sub_block(rgba: &[u8; 64], params: &CmpParams) -> [u8; 8] {
    let mut block = [0u8; 8];
    Format::Bc1.compress(rgba, 4, 4, params.squish(), &mut block);
    convert_sub_block(&block)
}

/// Decode CMP. Sub-blocks missing from `input` decode as transparent black.
pub fn decode_cmp(
    width: usize,
    height: usize,
    input: &[u8],
    output: &mut [u32],
    opts: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    validate(width, height, input.len(), output.len())?;
    let (bw, bh) = (GxFormat::CMP.block_width(), GxFormat::CMP.block_height());

    for (block, (x0, y0)) in block_origins(width, height, bw, bh).enumerate() {
        check_stop(stop)?;
        for (sub, (sx, sy)) in SUB_BLOCKS.iter().enumerate() {
            let offset = block * 32 + sub * 8;
            let decoded = input.get(offset..offset + 8).map(decode_sub_block);

            for i in 0..16 {
                let (x, y) = (x0 + sx + i % 4, y0 + sy + i / 4);
                if x >= width || y >= height {
                    continue;
                }
                let dst = flipped_index(x, y, width, height, opts.flip_x, opts.flip_y);
                if let Some(px) = output.get_mut(dst) {
                    *px = decoded.map_or(0, |d| {
                        pack(d[i * 4], d[i * 4 + 1], d[i * 4 + 2], d[i * 4 + 3])
                    });
                }
            }
        }
    }
    Ok(GxFormat::CMP.mip_size(width, height))
}

/// Encode CMP with `opts.cmp`. Stops at the last sub-block that fits in `output`.
pub fn encode_cmp(
    width: usize,
    height: usize,
    input: &[u32],
    output: &mut [u8],
    opts: &EncodeOptions,
    stop: &dyn Stop,
) -> Result<usize, GxError> {
    validate(width, height, input.len(), output.len())?;
    let (bw, bh) = (GxFormat::CMP.block_width(), GxFormat::CMP.block_height());

    let mut written = 0;
    for (block, (x0, y0)) in block_origins(width, height, bw, bh).enumerate() {
        check_stop(stop)?;
        for (sub, (sx, sy)) in SUB_BLOCKS.iter().enumerate() {
            // pixels outside the image stay transparent black
            let mut rgba = [0u8; 64];
            for (i, px) in rgba.chunks_exact_mut(4).enumerate() {
                let (x, y) = (x0 + sx + i % 4, y0 + sy + i / 4);
                if x < width && y < height {
                    let src = flipped_index(x, y, width, height, opts.flip_x, opts.flip_y);
                    let c = unpack(input.get(src).copied().unwrap_or(0));
                    px.copy_from_slice(&[c.r, c.g, c.b, c.a]);
                }
            }

            let offset = block * 32 + sub * 8;
            let Some(dst) = output.get_mut(offset..offset + 8) else {
                return Ok(written);
            };
            dst.copy_from_slice(&encode_sub_block(&rgba, &opts.cmp));
            written = offset + 8;
        }
    }
    Ok(written)
}
