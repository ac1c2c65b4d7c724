//! TXTR texture container.
//!
//! Big-endian layout:
//!
//! ```text
//! u32 format, u16 width, u16 height, u32 mip_count
//! [indexed only] u32 palette_format, u16 palette_width, u16 palette_height,
//!                palette_width * palette_height 16-bit entries
//! mip data, full size first, each level half the size of the previous one
//! ```

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use enough::Stop;
use imgref::ImgVec;

use crate::cmp::CmpParams;
use crate::codec::{self, DecodeOptions, EncodeOptions};
use crate::dither::{build_palette, DitherType};
use crate::error::{GxError, TxtrDecodeError, TxtrEncodeError, TxtrReadError, TxtrWriteError};
use crate::format::{GxFormat, PaletteFormat};
use crate::palette::{decode_palette, encode_palette};
use crate::pixel::AvgType;
use crate::resize::{resize_bgra, ResizeEdge, ResizeFilter};

/// Most mip levels a TXTR can hold.
pub const MAX_MIPS: u32 = 11;

/// One decoded mip level.
pub type Mipmap = ImgVec<u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxtrHeader {
    pub format: GxFormat,
    pub width: u16,
    pub height: u16,
    pub mip_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteHeader {
    pub format: PaletteFormat,
    pub width: u16,
    pub height: u16,
}

impl PaletteHeader {
    /// Number of palette entries.
    pub fn len(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Palette header plus the raw big-endian entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtrPalette {
    pub header: PaletteHeader,
    pub data: Vec<u8>,
}

/// A TXTR texture with its palette and mip data still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Txtr {
    pub header: TxtrHeader,
    /// Present exactly when the format is indexed.
    pub palette: Option<TxtrPalette>,
    /// Concatenated mip levels.
    pub mips: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeTxtrOptions {
    pub flip_x: bool,
    pub flip_y: bool,
    /// Decode every mip level instead of only the first.
    pub decode_all_mips: bool,
}

impl DecodeTxtrOptions {
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

    pub fn decode_all_mips(mut self, on: bool) -> Self {
        self.decode_all_mips = on;
        self
    }
}

/// Options for [`Txtr::encode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TxtrEncodeOptions {
    pub flip_x: bool,
    pub flip_y: bool,
    /// Most mips to produce, 0 to pick automatically (11, or 1 for indexed formats).
    pub mip_limit: u32,
    /// Mip generation stops before a level narrower than this.
    pub width_limit: u16,
    /// Mip generation stops before a level shorter than this.
    pub height_limit: u16,
    pub avg: AvgType,
    pub dither: DitherType,
    pub cmp: CmpParams,
    pub resize_filter: ResizeFilter,
    pub resize_edge: ResizeEdge,
}

impl Default for TxtrEncodeOptions {
    fn default() -> Self {
        Self {
            flip_x: false,
            flip_y: false,
            mip_limit: 0,
            width_limit: 1,
            height_limit: 1,
            avg: AvgType::default(),
            dither: DitherType::default(),
            cmp: CmpParams::default(),
            resize_filter: ResizeFilter::default(),
            resize_edge: ResizeEdge::default(),
        }
    }
}

impl TxtrEncodeOptions {
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

    pub fn mip_limit(mut self, n: u32) -> Self {
        self.mip_limit = n;
        self
    }

    pub fn width_limit(mut self, n: u16) -> Self {
        self.width_limit = n;
        self
    }

    pub fn height_limit(mut self, n: u16) -> Self {
        self.height_limit = n;
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

    pub fn resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.resize_filter = filter;
        self
    }

    /// How mip resampling samples past the image border.
    pub fn resize_edge(mut self, edge: ResizeEdge) -> Self {
        self.resize_edge = edge;
        self
    }

    fn codec_options(&self) -> EncodeOptions {
        EncodeOptions::new()
            .flip_x(self.flip_x)
            .flip_y(self.flip_y)
            .avg(self.avg)
            .dither(self.dither)
            .cmp(self.cmp)
    }
}

fn alloc_mip(len: usize) -> Result<Vec<u32>, TxtrDecodeError> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| TxtrDecodeError::OutOfMemory)?;
    pixels.resize(len, 0);
    Ok(pixels)
}

fn copy_bytes(src: &[u8]) -> Result<Vec<u8>, TxtrReadError> {
    let mut out = Vec::new();
    out.try_reserve_exact(src.len())
        .map_err(|_| TxtrReadError::OutOfMemory)?;
    out.extend_from_slice(src);
    Ok(out)
}

impl Txtr {
    /// Parse a TXTR file. Everything after the headers and palette is taken as mip data.
    pub fn read(bytes: &[u8]) -> Result<Self, TxtrReadError> {
        if bytes.is_empty() {
            return Err(TxtrReadError::InvalidParams);
        }
        let truncated = |_| TxtrReadError::Truncated;
        let mut rd = bytes;

        let format_id = rd.read_u32::<BigEndian>().map_err(truncated)?;
        let format =
            GxFormat::from_u32(format_id).ok_or(TxtrReadError::InvalidTextureFormat(format_id))?;
        let width = rd.read_u16::<BigEndian>().map_err(truncated)?;
        if width == 0 {
            return Err(TxtrReadError::InvalidWidth);
        }
        let height = rd.read_u16::<BigEndian>().map_err(truncated)?;
        if height == 0 {
            return Err(TxtrReadError::InvalidHeight);
        }
        let mip_count = rd.read_u32::<BigEndian>().map_err(truncated)?;
        if mip_count == 0 || mip_count > MAX_MIPS {
            return Err(TxtrReadError::InvalidMipCount(mip_count));
        }

        let palette = if format.is_indexed() {
            let pf = rd.read_u32::<BigEndian>().map_err(truncated)?;
            let pal_format =
                PaletteFormat::from_u32(pf).ok_or(TxtrReadError::InvalidPaletteFormat(pf))?;
            let pal_width = rd.read_u16::<BigEndian>().map_err(truncated)?;
            if pal_width == 0 {
                return Err(TxtrReadError::InvalidPaletteWidth);
            }
            let pal_height = rd.read_u16::<BigEndian>().map_err(truncated)?;
            if pal_height == 0 {
                return Err(TxtrReadError::InvalidPaletteHeight);
            }
            let header = PaletteHeader {
                format: pal_format,
                width: pal_width,
                height: pal_height,
            };
            let max = format.max_palette_size();
            if header.len() > max {
                return Err(TxtrReadError::InvalidPaletteSize {
                    size: header.len(),
                    max,
                });
            }
            let byte_len = header.len() * 2;
            if rd.len() < byte_len {
                return Err(TxtrReadError::Truncated);
            }
            let (entries, rest) = rd.split_at(byte_len);
            rd = rest;
            Some(TxtrPalette {
                header,
                data: copy_bytes(entries)?,
            })
        } else {
            None
        };

        let mips = copy_bytes(rd)?;
        tracing::debug!(
            ?format,
            width,
            height,
            mip_count,
            mip_bytes = mips.len(),
            "read TXTR"
        );

        Ok(Self {
            header: TxtrHeader {
                format,
                width,
                height,
                mip_count,
            },
            palette,
            mips,
        })
    }

    /// Decode the first mip, or every mip with
    /// [`decode_all_mips`](DecodeTxtrOptions::decode_all_mips). The chain ends early
    /// once a level would be empty or the mip data runs out.
    pub fn decode(
        &self,
        opts: &DecodeTxtrOptions,
        stop: &dyn Stop,
    ) -> Result<Vec<Mipmap>, TxtrDecodeError> {
        let header = self.header;
        let indexed = header.format.is_indexed();
        let pal = match &self.palette {
            Some(p) if indexed && !p.data.is_empty() => Some(p),
            _ if indexed => return Err(TxtrDecodeError::InvalidPalette),
            _ => None,
        };
        if self.mips.is_empty() {
            return Err(TxtrDecodeError::InvalidMips);
        }
        if header.width == 0 {
            return Err(TxtrDecodeError::InvalidWidth);
        }
        if header.height == 0 {
            return Err(TxtrDecodeError::InvalidHeight);
        }
        if header.mip_count == 0 || header.mip_count > MAX_MIPS {
            return Err(TxtrDecodeError::InvalidMipCount(header.mip_count));
        }

        let palette = match pal {
            Some(p) => decode_palette(p.header.format, &p.data)
                .map_err(TxtrDecodeError::PaletteDecode)?,
            None => Vec::new(),
        };

        let levels = if opts.decode_all_mips {
            header.mip_count as usize
        } else {
            1
        };
        let gx = DecodeOptions::new().flip_x(opts.flip_x).flip_y(opts.flip_y);
        let (mut width, mut height) = (usize::from(header.width), usize::from(header.height));
        let mut rest: &[u8] = &self.mips;
        let mut out = Vec::with_capacity(levels);

        for level in 0..levels {
            if width == 0 || height == 0 || rest.is_empty() {
                break;
            }
            let mut pixels = alloc_mip(width * height)?;
            let consumed = codec::decode(
                header.format,
                width,
                height,
                rest,
                &palette,
                &mut pixels,
                &gx,
                stop,
            )
            .map_err(|e| match e {
                GxError::Interrupted => TxtrDecodeError::Interrupted,
                source => TxtrDecodeError::MipDecode { level, source },
            })?;
            tracing::trace!(level, width, height, consumed, "decoded mip");

            out.push(ImgVec::new(pixels, width, height));
            rest = rest.get(consumed..).unwrap_or_default();
            width /= 2;
            height /= 2;
        }

        tracing::debug!(format = ?header.format, mips = out.len(), "decoded TXTR");
        Ok(out)
    }

    /// Build a texture from `width * height` packed pixels.
    ///
    /// Indexed formats quantize the image to a palette first and never carry more than
    /// one mip. Other formats produce mips down to the width and height limits, each
    /// resampled from the full-size source.
    pub fn encode(
        format: GxFormat,
        palette_format: PaletteFormat,
        width: u16,
        height: u16,
        pixels: &[u32],
        opts: &TxtrEncodeOptions,
        stop: &dyn Stop,
    ) -> Result<Self, TxtrEncodeError> {
        if width == 0 {
            return Err(TxtrEncodeError::InvalidWidth);
        }
        if height == 0 {
            return Err(TxtrEncodeError::InvalidHeight);
        }
        if pixels.len() != usize::from(width) * usize::from(height) {
            return Err(TxtrEncodeError::InvalidParams {
                len: pixels.len(),
                width,
                height,
            });
        }
        if opts.mip_limit > MAX_MIPS {
            return Err(TxtrEncodeError::InvalidMipLimit(opts.mip_limit));
        }
        if opts.width_limit == 0 || opts.width_limit > width {
            return Err(TxtrEncodeError::InvalidWidthLimit {
                limit: opts.width_limit,
                width,
            });
        }
        if opts.height_limit == 0 || opts.height_limit > height {
            return Err(TxtrEncodeError::InvalidHeightLimit {
                limit: opts.height_limit,
                height,
            });
        }
        let indexed = format.is_indexed();
        if indexed && opts.mip_limit > 1 {
            return Err(TxtrEncodeError::MipmappedPalette);
        }

        let (w, h) = (usize::from(width), usize::from(height));
        let (palette, indices) = if indexed {
            let built = build_palette(w, h, pixels, format.max_palette_size(), opts.dither, stop)
                .map_err(|e| match e {
                    GxError::Interrupted => TxtrEncodeError::Interrupted,
                    e => TxtrEncodeError::BuildPalette(e),
                })?;
            let len = built.palette.len();
            let pal_width = u16::try_from(len)
                .map_err(|_| TxtrEncodeError::EncodePalette(GxError::InvalidPaletteSize(len)))?;
            let data = encode_palette(palette_format, &built.palette, opts.avg)
                .map_err(TxtrEncodeError::EncodePalette)?;
            tracing::debug!(colors = len, dither = ?opts.dither, "built palette");
            let palette = TxtrPalette {
                header: PaletteHeader {
                    format: palette_format,
                    width: pal_width,
                    height: 1,
                },
                data,
            };
            (Some(palette), Some(built.indices))
        } else {
            (None, None)
        };
        let palette_len = palette.as_ref().map_or(0, |p| p.header.len());

        let levels = match opts.mip_limit {
            0 if indexed => 1,
            0 => MAX_MIPS,
            n => n,
        };
        let gx = opts.codec_options();
        let (mut mip_w, mut mip_h) = (width, height);
        let mut mips = Vec::new();
        let mut mip_count = 0;

        for level in 0..levels as usize {
            if mip_w < opts.width_limit || mip_h < opts.height_limit {
                break;
            }
            let (mw, mh) = (usize::from(mip_w), usize::from(mip_h));

            let resized;
            let src: &[u32] = if level == 0 {
                indices.as_deref().unwrap_or(pixels)
            } else {
                resized = resize_bgra(
                    pixels,
                    u32::from(width),
                    u32::from(height),
                    u32::from(mip_w),
                    u32::from(mip_h),
                    opts.resize_filter,
                    opts.resize_edge,
                )
                .ok_or(TxtrEncodeError::Resize)?;
                &resized
            };

            let start = mips.len();
            mips.resize(start + format.mip_size(mw, mh), 0);
            codec::encode(format, mw, mh, src, palette_len, &mut mips[start..], &gx, stop)
                .map_err(|e| match e {
                    GxError::Interrupted => TxtrEncodeError::Interrupted,
                    source => TxtrEncodeError::MipEncode { level, source },
                })?;
            tracing::trace!(level, width = mw, height = mh, "encoded mip");

            mip_count += 1;
            mip_w /= 2;
            mip_h /= 2;
        }

        tracing::debug!(?format, width, height, mip_count, "encoded TXTR");
        Ok(Self {
            header: TxtrHeader {
                format,
                width,
                height,
                mip_count,
            },
            palette,
            mips,
        })
    }

    /// Serialize headers, palette and mip data.
    pub fn write(&self, stop: &dyn Stop) -> Result<Vec<u8>, TxtrWriteError> {
        let header = self.header;
        if header.format.is_indexed() != self.palette.is_some() {
            return Err(TxtrWriteError::InvalidParams);
        }
        if header.width == 0 {
            return Err(TxtrWriteError::InvalidWidth);
        }
        if header.height == 0 {
            return Err(TxtrWriteError::InvalidHeight);
        }
        if header.mip_count == 0 || header.mip_count > MAX_MIPS {
            return Err(TxtrWriteError::InvalidMipCount(header.mip_count));
        }
        if let Some(p) = &self.palette {
            if p.header.width == 0 {
                return Err(TxtrWriteError::InvalidPaletteWidth);
            }
            if p.header.height == 0 {
                return Err(TxtrWriteError::InvalidPaletteHeight);
            }
            let max = header.format.max_palette_size();
            let size = p.header.len();
            if size > max || p.data.len() != size * 2 {
                return Err(TxtrWriteError::InvalidPaletteSize { size, max });
            }
        }
        if self.mips.is_empty() {
            return Err(TxtrWriteError::InvalidMips);
        }
        stop.check().map_err(|_| TxtrWriteError::Interrupted)?;

        let pal_len = self.palette.as_ref().map_or(0, |p| 8 + p.data.len());
        let mut out = Vec::with_capacity(12 + pal_len + self.mips.len());

        let mut head = [0u8; 12];
        BigEndian::write_u32(&mut head[0..4], header.format.to_u32());
        BigEndian::write_u16(&mut head[4..6], header.width);
        BigEndian::write_u16(&mut head[6..8], header.height);
        BigEndian::write_u32(&mut head[8..12], header.mip_count);
        out.extend_from_slice(&head);

        if let Some(p) = &self.palette {
            let mut pal_head = [0u8; 8];
            BigEndian::write_u32(&mut pal_head[0..4], p.header.format.to_u32());
            BigEndian::write_u16(&mut pal_head[4..6], p.header.width);
            BigEndian::write_u16(&mut pal_head[6..8], p.header.height);
            out.extend_from_slice(&pal_head);
            out.extend_from_slice(&p.data);
        }
        out.extend_from_slice(&self.mips);

        tracing::debug!(bytes = out.len(), "wrote TXTR");
        Ok(out)
    }
}
