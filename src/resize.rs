//! Image resampling for mip generation.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::pixel::{pack, unpack};

/// Resampling filter used to derive smaller mip levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    Nearest,
    /// Linear (tent) filter.
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(f: ResizeFilter) -> Self {
        match f {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// What the filter sees past the image border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeEdge {
    /// Repeat the edge pixel.
    #[default]
    Clamp,
    /// Mirror the image about its edges.
    Reflect,
    /// Tile the image.
    Wrap,
    /// Transparent black.
    Zero,
}

impl ResizeEdge {
    /// Source coordinate for `n` in `-len..2 * len`, or `None` for a zero sample.
    fn source(self, n: i64, len: i64) -> Option<i64> {
        if (0..len).contains(&n) {
            return Some(n);
        }
        match self {
            ResizeEdge::Clamp => Some(n.clamp(0, len - 1)),
            ResizeEdge::Reflect if n < 0 => Some((-n).min(len - 1)),
            ResizeEdge::Reflect => Some((2 * len - n - 1).max(0)),
            ResizeEdge::Wrap => Some(n.rem_euclid(len)),
            ResizeEdge::Zero => None,
        }
    }
}

/// Surrounds the image with a copy of itself (or zeros) on every side, per `edge`.
fn pad(img: &RgbaImage, edge: ResizeEdge) -> RgbaImage {
    let (w, h) = img.dimensions();
    let (wi, hi) = (i64::from(w), i64::from(h));
    RgbaImage::from_fn(w * 3, h * 3, |x, y| {
        let sx = edge.source(i64::from(x) - wi, wi);
        let sy = edge.source(i64::from(y) - hi, hi);
        match (sx, sy) {
            (Some(sx), Some(sy)) => *img.get_pixel(sx as u32, sy as u32),
            _ => Rgba([0; 4]),
        }
    })
}

/// Resize a packed BGRA image. Returns `None` when either size is zero or `src` does
/// not hold `width * height` pixels.
pub fn resize_bgra(
    src: &[u32],
    width: u32,
    height: u32,
    new_width: u32,
    new_height: u32,
    filter: ResizeFilter,
    edge: ResizeEdge,
) -> Option<Vec<u32>> {
    if width == 0 || height == 0 || new_width == 0 || new_height == 0 {
        return None;
    }
    if src.len() != width as usize * height as usize {
        return None;
    }
    if (width, height) == (new_width, new_height) {
        return Some(src.to_vec());
    }

    let raw: Vec<u8> = src
        .iter()
        .flat_map(|&p| {
            let c = unpack(p);
            [c.r, c.g, c.b, c.a]
        })
        .collect();
    let img = RgbaImage::from_raw(width, height, raw)?;
    // image only clamps, so other edge modes resize a padded copy and keep the middle
    let scaled = match edge {
        ResizeEdge::Clamp => imageops::resize(&img, new_width, new_height, filter.into()),
        _ => {
            let padded = pad(&img, edge);
            let (pw, ph) = (new_width.checked_mul(3)?, new_height.checked_mul(3)?);
            let big = imageops::resize(&padded, pw, ph, filter.into());
            imageops::crop_imm(&big, new_width, new_height, new_width, new_height).to_image()
        }
    };

    Some(
        scaled
            .pixels()
            .map(|px| {
                let [r, g, b, a] = px.0;
                pack(r, g, b, a)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_stays_flat() {
        let color = pack(12, 34, 56, 255);
        let src = vec![color; 16 * 8];
        for filter in [
            ResizeFilter::Nearest,
            ResizeFilter::Triangle,
            ResizeFilter::CatmullRom,
            ResizeFilter::Gaussian,
            ResizeFilter::Lanczos3,
        ] {
            let out = resize_bgra(&src, 16, 8, 8, 4, filter, ResizeEdge::Clamp).unwrap();
            assert_eq!(out.len(), 32);
            assert!(out.iter().all(|&p| p == color), "{filter:?}");
        }
    }

    #[test]
    fn bad_arguments() {
        let edge = ResizeEdge::Clamp;
        assert!(resize_bgra(&[0; 4], 2, 2, 0, 1, ResizeFilter::Nearest, edge).is_none());
        assert!(resize_bgra(&[0; 3], 2, 2, 1, 1, ResizeFilter::Nearest, edge).is_none());
    }

    #[test]
    fn edge_source_coordinates() {
        assert_eq!(ResizeEdge::Clamp.source(-2, 4), Some(0));
        assert_eq!(ResizeEdge::Clamp.source(5, 4), Some(3));
        assert_eq!(ResizeEdge::Reflect.source(-1, 4), Some(1));
        assert_eq!(ResizeEdge::Reflect.source(-4, 4), Some(3));
        assert_eq!(ResizeEdge::Reflect.source(4, 4), Some(3));
        assert_eq!(ResizeEdge::Reflect.source(7, 4), Some(0));
        assert_eq!(ResizeEdge::Wrap.source(-1, 4), Some(3));
        assert_eq!(ResizeEdge::Wrap.source(4, 4), Some(0));
        assert_eq!(ResizeEdge::Zero.source(-1, 4), None);
        assert_eq!(ResizeEdge::Zero.source(2, 4), Some(2));
    }

    #[test]
    fn wrap_pulls_in_the_opposite_edge() {
        // red left column, blue elsewhere
        let src: Vec<u32> = (0..16)
            .map(|i| if i % 4 == 0 { pack(255, 0, 0, 255) } else { pack(0, 0, 255, 255) })
            .collect();
        let right_red = |edge| {
            let out = resize_bgra(&src, 4, 4, 2, 2, ResizeFilter::Triangle, edge).unwrap();
            unpack(out[1]).r
        };
        assert_eq!(right_red(ResizeEdge::Clamp), 0);
        assert!(right_red(ResizeEdge::Wrap) > 0);
    }

    #[test]
    fn zero_edge_fades_the_border() {
        let color = pack(12, 34, 56, 255);
        let src = vec![color; 4 * 4];
        for edge in [ResizeEdge::Clamp, ResizeEdge::Reflect, ResizeEdge::Wrap] {
            let out = resize_bgra(&src, 4, 4, 2, 2, ResizeFilter::Triangle, edge).unwrap();
            assert!(out.iter().all(|&p| p == color), "{edge:?}");
        }
        let out = resize_bgra(&src, 4, 4, 2, 2, ResizeFilter::Triangle, ResizeEdge::Zero).unwrap();
        assert!(out.iter().all(|&p| unpack(p).a < 255));
    }
}
