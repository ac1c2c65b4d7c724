use enough::Stop;

use crate::codec::check_stop;
use crate::error::GxError;
use crate::octree::OctreeQuantizer;
use crate::pixel::{pack_bgra, unpack, Bgra8};

/// Error diffusion kernel applied while mapping pixels to a built palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherType {
    /// Nearest palette entry only.
    #[default]
    Threshold,
    FloydSteinberg,
    Atkinson,
    JarvisJudiceNinke,
    Stucki,
    Burkes,
    TwoRowSierra,
    Sierra,
    SierraLite,
}

/// (row offset, column offset, numerator)
type Kernel = &'static [(usize, isize, u8)];

const FLOYD_STEINBERG: Kernel = &[(0, 1, 7), (1, -1, 3), (1, 0, 5), (1, 1, 1)];
// classic Atkinson: only 6/8 of the error is carried
const ATKINSON: Kernel = &[(0, 1, 1), (0, 2, 1), (1, -1, 1), (1, 0, 1), (1, 1, 1), (2, 0, 1)];
const JARVIS_JUDICE_NINKE: Kernel = &[
    (0, 1, 7),
    (0, 2, 5),
    (1, -2, 3),
    (1, -1, 5),
    (1, 0, 7),
    (1, 1, 5),
    (1, 2, 3),
    (2, -2, 1),
    (2, -1, 3),
    (2, 0, 5),
    (2, 1, 3),
    (2, 2, 1),
];
const STUCKI: Kernel = &[
    (0, 1, 8),
    (0, 2, 4),
    (1, -2, 2),
    (1, -1, 4),
    (1, 0, 8),
    (1, 1, 4),
    (1, 2, 2),
    (2, -2, 1),
    (2, -1, 2),
    (2, 0, 4),
    (2, 1, 2),
    (2, 2, 1),
];
const BURKES: Kernel = &[(0, 1, 8), (0, 2, 4), (1, -2, 2), (1, -1, 4), (1, 0, 8), (1, 1, 4), (1, 2, 2)];
const TWO_ROW_SIERRA: Kernel = &[
    (0, 1, 5),
    (0, 2, 3),
    (1, -2, 2),
    (1, -1, 4),
    (1, 0, 5),
    (1, 1, 4),
    (1, 2, 2),
    (2, -1, 2),
    (2, 0, 3),
    (2, 1, 2),
];
const SIERRA: Kernel = &[(0, 1, 4), (0, 2, 3), (1, -2, 1), (1, -1, 2), (1, 0, 3), (1, 1, 2), (1, 2, 1)];
const SIERRA_LITE: Kernel = &[(0, 1, 2), (1, -1, 1), (1, 0, 1)];

impl DitherType {
    fn kernel(self) -> Option<(Kernel, f32)> {
        match self {
            DitherType::Threshold => None,
            DitherType::FloydSteinberg => Some((FLOYD_STEINBERG, 16.0)),
            DitherType::Atkinson => Some((ATKINSON, 8.0)),
            DitherType::JarvisJudiceNinke => Some((JARVIS_JUDICE_NINKE, 48.0)),
            DitherType::Stucki => Some((STUCKI, 42.0)),
            DitherType::Burkes => Some((BURKES, 32.0)),
            DitherType::TwoRowSierra => Some((TWO_ROW_SIERRA, 32.0)),
            DitherType::Sierra => Some((SIERRA, 16.0)),
            DitherType::SierraLite => Some((SIERRA_LITE, 4.0)),
        }
    }
}

/// Pixel a kernel tap at (`dy`, `dx`) from (`x`, `y`) lands on. Negative column
/// offsets near the left edge land on the current column.
fn tap_target(
    x: usize,
    y: usize,
    dy: usize,
    dx: isize,
    width: usize,
    height: usize,
) -> Option<usize> {
    let ix = if x < 2 && dx < 0 {
        x
    } else {
        x.wrapping_add_signed(dx)
    };
    let iy = y + dy;
    (ix < width && iy < height).then_some(iy * width + ix)
}

/// Result of [`build_palette`]: one palette index per pixel plus the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPalette {
    pub indices: Vec<u32>,
    pub palette: Vec<u32>,
}

/// Quantize an image to at most `max_palette_size` colors and map every pixel to it,
/// diffusing the mapping error with `dither`.
///
/// `max_palette_size` must be the size of a GX palette: 16, 256 or 16384.
pub fn build_palette(
    width: usize,
    height: usize,
    pixels: &[u32],
    max_palette_size: usize,
    dither: DitherType,
    stop: &dyn Stop,
) -> Result<BuiltPalette, GxError> {
    if width == 0 || height == 0 {
        return Err(GxError::ZeroDimension);
    }
    if pixels.len() != width * height {
        return Err(GxError::DimensionMismatch {
            len: pixels.len(),
            width,
            height,
        });
    }
    if !matches!(max_palette_size, 16 | 256 | 16384) {
        return Err(GxError::InvalidPaletteSize(max_palette_size));
    }

    let mut octree = OctreeQuantizer::new();
    for row in pixels.chunks_exact(width) {
        check_stop(stop)?;
        for &p in row {
            octree.add_color(p);
        }
    }
    let palette = octree.make_palette(max_palette_size);
    if palette.is_empty() {
        return Err(GxError::EmptyPalette);
    }

    let mut scratch: Vec<Bgra8> = pixels.iter().map(|&p| unpack(p)).collect();
    let mut indices = vec![0u32; pixels.len()];
    let kernel = dither.kernel();

    let diffuse_err = |buf: &mut [Bgra8], target: usize, fraction: f32, err: [i32; 4]| {
        let apply = |c: u8, e: i32| {
            (i32::from(c) + (e as f32 * fraction).round() as i32).clamp(0, 255) as u8
        };
        let px = &mut buf[target];
        px.r = apply(px.r, err[0]);
        px.g = apply(px.g, err[1]);
        px.b = apply(px.b, err[2]);
        px.a = apply(px.a, err[3]);
    };

    for y in 0..height {
        check_stop(stop)?;
        for x in 0..width {
            let idx = y * width + x;
            let current = scratch[idx];
            let pal_idx = octree
                .palette_index(pack_bgra(current))
                .filter(|&i| i < palette.len())
                .unwrap_or(0);
            indices[idx] = pal_idx as u32;

            let Some((taps, divisor)) = kernel else {
                continue;
            };
            let chosen = unpack(palette[pal_idx]);
            let err = [
                i32::from(current.r) - i32::from(chosen.r),
                i32::from(current.g) - i32::from(chosen.g),
                i32::from(current.b) - i32::from(chosen.b),
                i32::from(current.a) - i32::from(chosen.a),
            ];
            if err == [0; 4] {
                continue;
            }

            for &(dy, dx, weight) in taps {
                if let Some(target) = tap_target(x, y, dy, dx, width, height) {
                    diffuse_err(&mut scratch, target, f32::from(weight) / divisor, err);
                }
            }
        }
    }

    Ok(BuiltPalette { indices, palette })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{gray, pack};
    use enough::Unstoppable;

    const ALL: [DitherType; 9] = [
        DitherType::Threshold,
        DitherType::FloydSteinberg,
        DitherType::Atkinson,
        DitherType::JarvisJudiceNinke,
        DitherType::Stucki,
        DitherType::Burkes,
        DitherType::TwoRowSierra,
        DitherType::Sierra,
        DitherType::SierraLite,
    ];

    #[test]
    fn kernel_weights() {
        for dither in ALL {
            let Some((taps, divisor)) = dither.kernel() else {
                continue;
            };
            let total: u32 = taps.iter().map(|&(_, _, w)| u32::from(w)).sum();
            let expected = if dither == DitherType::Atkinson { 6.0 } else { divisor };
            assert_eq!(total as f32, expected, "{dither:?}");
        }
    }

    #[test]
    fn taps_near_the_left_edge_fold_onto_the_current_column() {
        assert_eq!(tap_target(0, 0, 1, -1, 4, 4), Some(4));
        assert_eq!(tap_target(1, 0, 1, -2, 4, 4), Some(5));
        assert_eq!(tap_target(1, 0, 2, -1, 4, 4), Some(9));
        assert_eq!(tap_target(2, 0, 1, -2, 4, 4), Some(4));
        assert_eq!(tap_target(3, 1, 0, 1, 4, 4), None);
        assert_eq!(tap_target(0, 3, 1, 0, 4, 4), None);
    }

    #[test]
    fn indices_point_into_palette() {
        let (w, h) = (37, 11);
        let pixels: Vec<u32> = (0..w * h)
            .map(|i| pack((i * 7) as u8, (i * 13) as u8, (i * 3) as u8, 0xFF))
            .collect();
        for dither in ALL {
            let built = build_palette(w, h, &pixels, 16, dither, &Unstoppable).unwrap();
            assert!(!built.palette.is_empty() && built.palette.len() <= 16);
            assert_eq!(built.indices.len(), pixels.len());
            assert!(built.indices.iter().all(|&i| (i as usize) < built.palette.len()));
        }
    }

    #[test]
    fn exact_palette_means_no_error() {
        let pixels = [gray(0, 255), gray(255, 255), gray(0, 255), gray(255, 255)];
        let built =
            build_palette(2, 2, &pixels, 16, DitherType::FloydSteinberg, &Unstoppable).unwrap();
        let mapped: Vec<u32> = built.indices.iter().map(|&i| built.palette[i as usize]).collect();
        assert_eq!(mapped, pixels);
    }

    #[test]
    fn validation() {
        let px = [0u32; 4];
        assert_eq!(
            build_palette(2, 2, &px[..3], 16, DitherType::Threshold, &Unstoppable),
            Err(GxError::DimensionMismatch {
                len: 3,
                width: 2,
                height: 2
            })
        );
        assert_eq!(
            build_palette(2, 2, &px, 17, DitherType::Threshold, &Unstoppable),
            Err(GxError::InvalidPaletteSize(17))
        );
        assert_eq!(
            build_palette(0, 2, &px, 16, DitherType::Threshold, &Unstoppable),
            Err(GxError::ZeroDimension)
        );
    }
}
