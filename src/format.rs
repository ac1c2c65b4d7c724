/// GX texture formats, numbered as they appear in TXTR headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GxFormat {
    I4,
    I8,
    IA4,
    IA8,
    CI4,
    CI8,
    CI14X2,
    R5G6B5,
    RGB5A3,
    RGBA8,
    CMP,
}

impl GxFormat {
    pub const ALL: [GxFormat; 11] = [
        GxFormat::I4,
        GxFormat::I8,
        GxFormat::IA4,
        GxFormat::IA8,
        GxFormat::CI4,
        GxFormat::CI8,
        GxFormat::CI14X2,
        GxFormat::R5G6B5,
        GxFormat::RGB5A3,
        GxFormat::RGBA8,
        GxFormat::CMP,
    ];

    pub fn from_u32(v: u32) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    pub fn to_u32(self) -> u32 {
        self as u32
    }

    pub fn block_width(self) -> usize {
        match self {
            GxFormat::I4 | GxFormat::I8 | GxFormat::IA4 => 8,
            GxFormat::CI4 | GxFormat::CI8 | GxFormat::CMP => 8,
            GxFormat::IA8 | GxFormat::CI14X2 => 4,
            GxFormat::R5G6B5 | GxFormat::RGB5A3 | GxFormat::RGBA8 => 4,
        }
    }

    pub fn block_height(self) -> usize {
        match self {
            GxFormat::I4 | GxFormat::CI4 | GxFormat::CMP => 8,
            _ => 4,
        }
    }

    pub fn bits_per_pixel(self) -> usize {
        match self {
            GxFormat::I4 | GxFormat::CI4 | GxFormat::CMP => 4,
            GxFormat::I8 | GxFormat::IA4 | GxFormat::CI8 => 8,
            GxFormat::IA8 | GxFormat::CI14X2 | GxFormat::R5G6B5 | GxFormat::RGB5A3 => 16,
            GxFormat::RGBA8 => 32,
        }
    }

    /// Width of a palette index in bits, for the color-indexed formats.
    pub fn palette_bits(self) -> Option<u32> {
        match self {
            GxFormat::CI4 => Some(4),
            GxFormat::CI8 => Some(8),
            GxFormat::CI14X2 => Some(14),
            _ => None,
        }
    }

    pub fn is_indexed(self) -> bool {
        self.palette_bits().is_some()
    }

    /// Largest palette an indexed format can address, 0 for direct formats.
    pub fn max_palette_size(self) -> usize {
        self.palette_bits().map_or(0, |bits| 1 << bits)
    }

    /// Size in bytes of one fully tiled mip of `width` x `height` pixels.
    pub fn mip_size(self, width: usize, height: usize) -> usize {
        mip_size(width, height, self.bits_per_pixel())
    }
}

/// Formats a TXTR palette may be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaletteFormat {
    IA8,
    R5G6B5,
    #[default]
    RGB5A3,
}

impl PaletteFormat {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(PaletteFormat::IA8),
            1 => Some(PaletteFormat::R5G6B5),
            2 => Some(PaletteFormat::RGB5A3),
            _ => None,
        }
    }

    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

#[inline]
fn align(v: usize, to: usize) -> usize {
    v.div_ceil(to) * to
}

/// Bytes needed for a `width` x `height` image at `bpp` bits per pixel, padded out to
/// whole blocks. Unknown depths return 0.
pub fn mip_size(width: usize, height: usize, bpp: usize) -> usize {
    match bpp {
        4 => align(width, 8) * align(height, 8) / 2,
        8 => align(width, 8) * align(height, 4),
        16 => align(width, 4) * align(height, 4) * 2,
        32 => align(width, 4) * align(height, 4) * 4,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_round_trips() {
        for (i, f) in GxFormat::ALL.iter().enumerate() {
            assert_eq!(f.to_u32(), i as u32);
            assert_eq!(GxFormat::from_u32(i as u32), Some(*f));
        }
        assert_eq!(GxFormat::from_u32(11), None);
        assert_eq!(PaletteFormat::from_u32(3), None);
    }

    #[test]
    fn block_sizes_match_bit_depth() {
        // every block is 32 bytes except RGBA8, which spans two 32-byte halves
        for f in GxFormat::ALL {
            let bytes = f.block_width() * f.block_height() * f.bits_per_pixel() / 8;
            let expected = if f == GxFormat::RGBA8 { 64 } else { 32 };
            assert_eq!(bytes, expected, "{f:?}");
        }
    }

    #[test]
    fn mip_sizes_pad_to_blocks() {
        assert_eq!(GxFormat::I4.mip_size(1, 1), 32);
        assert_eq!(GxFormat::I8.mip_size(8, 4), 32);
        assert_eq!(GxFormat::I8.mip_size(9, 4), 64);
        assert_eq!(GxFormat::RGB5A3.mip_size(16, 16), 512);
        assert_eq!(GxFormat::RGBA8.mip_size(5, 3), 8 * 4 * 4);
        assert_eq!(GxFormat::CMP.mip_size(16, 16), 128);
        assert_eq!(mip_size(4, 4, 12), 0);
    }

    #[test]
    fn palette_limits() {
        assert_eq!(GxFormat::CI4.max_palette_size(), 16);
        assert_eq!(GxFormat::CI8.max_palette_size(), 256);
        assert_eq!(GxFormat::CI14X2.max_palette_size(), 16384);
        assert_eq!(GxFormat::RGBA8.max_palette_size(), 0);
        assert!(!GxFormat::CMP.is_indexed());
    }
}
