//! The canonical pixel word: B at bit 0, G at bit 8, R at bit 16, A at bit 24.

use rgb::alt::BGRA;

pub type Bgra8 = BGRA<u8>;

pub const SHIFT_B: u32 = 0;
pub const SHIFT_G: u32 = 8;
pub const SHIFT_R: u32 = 16;
pub const SHIFT_A: u32 = 24;

/// Opaque black, the fallback color for missing opaque-format data.
pub const OPAQUE_BLACK: u32 = 0xFF << SHIFT_A;

#[inline]
pub fn pack(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (u32::from(b) << SHIFT_B)
        | (u32::from(g) << SHIFT_G)
        | (u32::from(r) << SHIFT_R)
        | (u32::from(a) << SHIFT_A)
}

#[inline]
pub fn unpack(p: u32) -> Bgra8 {
    BGRA {
        b: (p >> SHIFT_B) as u8,
        g: (p >> SHIFT_G) as u8,
        r: (p >> SHIFT_R) as u8,
        a: (p >> SHIFT_A) as u8,
    }
}

#[inline]
pub fn pack_bgra(c: Bgra8) -> u32 {
    pack(c.r, c.g, c.b, c.a)
}

/// Gray pixel with the given alpha.
#[inline]
pub fn gray(i: u8, a: u8) -> u32 {
    pack(i, i, i, a)
}

#[inline]
pub fn alpha(p: u32) -> u8 {
    (p >> SHIFT_A) as u8
}

/// How RGB collapses to a single intensity for the I and IA formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvgType {
    /// `(r + g + b) / 3`
    #[default]
    Average,
    /// Root mean square of the three channels.
    Squared,
    /// W3C luma, `0.299 r + 0.587 g + 0.114 b`.
    W3c,
    /// sRGB / Rec. 709 luma, `0.2126 r + 0.7152 g + 0.0722 b`.
    Srgb,
}

impl AvgType {
    pub fn intensity(self, p: u32) -> u8 {
        let c = unpack(p);
        let (r, g, b) = (u32::from(c.r), u32::from(c.g), u32::from(c.b));
        let i = match self {
            AvgType::Average => (r + g + b) / 3,
            AvgType::Squared => (f64::from((r * r + g * g + b * b) / 3)).sqrt() as u32,
            AvgType::W3c => (r * 299 + g * 587 + b * 114) / 1000,
            AvgType::Srgb => (r * 2126 + g * 7152 + b * 722) / 10000,
        };
        i.min(255) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_layout_is_bgra() {
        assert_eq!(pack(0x11, 0x22, 0x33, 0x44), 0x4411_2233);
        let c = unpack(0x4411_2233);
        assert_eq!((c.r, c.g, c.b, c.a), (0x11, 0x22, 0x33, 0x44));
        assert_eq!(pack_bgra(c), 0x4411_2233);
    }

    #[test]
    fn intensity_of_gray_is_identity() {
        for avg in [AvgType::Average, AvgType::Squared, AvgType::W3c, AvgType::Srgb] {
            for v in [0u8, 1, 77, 128, 254, 255] {
                assert_eq!(avg.intensity(gray(v, 255)), v, "{avg:?} {v}");
            }
        }
    }

    #[test]
    fn intensity_weights() {
        let red = pack(255, 0, 0, 255);
        assert_eq!(AvgType::Average.intensity(red), 85);
        assert_eq!(AvgType::W3c.intensity(red), 76);
        assert_eq!(AvgType::Srgb.intensity(red), 54);
        assert_eq!(AvgType::Squared.intensity(red), 147);
    }
}
