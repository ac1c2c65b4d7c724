use gxtexture::bits::{expand, truncate};
use gxtexture::pixel::{gray, pack};
use gxtexture::{
    build_palette, decode, decode_palette, encode, encode_palette, AvgType, DecodeOptions,
    DitherType, EncodeOptions, GxError, GxFormat, OctreeQuantizer, PaletteFormat, Unstoppable,
};

const W: usize = 12;
const H: usize = 6;

fn roundtrip(format: GxFormat, input: &[u32], palette: &[u32]) -> Vec<u32> {
    let mut encoded = vec![0u8; format.mip_size(W, H)];
    let written = encode(
        format,
        W,
        H,
        input,
        palette.len(),
        &mut encoded,
        &EncodeOptions::new(),
        &Unstoppable,
    )
    .unwrap();
    assert_eq!(written, encoded.len(), "{format:?}");

    let mut decoded = vec![0u32; W * H];
    let consumed = decode(
        format,
        W,
        H,
        &encoded,
        palette,
        &mut decoded,
        &DecodeOptions::new(),
        &Unstoppable,
    )
    .unwrap();
    assert_eq!(consumed, encoded.len(), "{format:?}");
    decoded
}

#[test]
fn intensity_formats_roundtrip() {
    let i4: Vec<u32> = (0..W * H).map(|i| gray(0x11 * (i % 16) as u8, 0xFF)).collect();
    assert_eq!(roundtrip(GxFormat::I4, &i4, &[]), i4);

    let i8: Vec<u32> = (0..W * H).map(|i| gray((i * 3) as u8, 0xFF)).collect();
    assert_eq!(roundtrip(GxFormat::I8, &i8, &[]), i8);

    let ia4: Vec<u32> = (0..W * H)
        .map(|i| gray(0x11 * (i % 16) as u8, 0x11 * (i % 7) as u8))
        .collect();
    assert_eq!(roundtrip(GxFormat::IA4, &ia4, &[]), ia4);

    let ia8: Vec<u32> = (0..W * H)
        .map(|i| gray((i * 3) as u8, (255 - i) as u8))
        .collect();
    assert_eq!(roundtrip(GxFormat::IA8, &ia8, &[]), ia8);
}

#[test]
fn color_formats_roundtrip() {
    let r5g6b5: Vec<u32> = (0..(W * H) as u32)
        .map(|i| pack(expand(i % 32, 5), expand(i % 64, 6), expand(31 - i % 32, 5), 0xFF))
        .collect();
    assert_eq!(roundtrip(GxFormat::R5G6B5, &r5g6b5, &[]), r5g6b5);

    // opaque pixels use 5-bit channels, translucent ones 4-bit channels and 3-bit alpha
    let rgb5a3: Vec<u32> = (0..(W * H) as u32)
        .map(|i| {
            if i % 2 == 0 {
                pack(expand(i % 32, 5), expand(i / 2 % 32, 5), 0, 0xFF)
            } else {
                pack(expand(i % 16, 4), 0, expand(i / 4 % 16, 4), expand(i % 7, 3))
            }
        })
        .collect();
    assert_eq!(roundtrip(GxFormat::RGB5A3, &rgb5a3, &[]), rgb5a3);

    let rgba8: Vec<u32> = (0..(W * H) as u32).map(|i| i.wrapping_mul(0x0102_0305)).collect();
    assert_eq!(roundtrip(GxFormat::RGBA8, &rgba8, &[]), rgba8);
}

#[test]
fn indexed_formats_roundtrip() {
    let palette: Vec<u32> = (0..300u32).map(|i| 0xFF00_0000 | (i * 0x0103)).collect();
    for (format, colors) in [
        (GxFormat::CI4, 16),
        (GxFormat::CI8, 256),
        (GxFormat::CI14X2, 300),
    ] {
        let indices: Vec<u32> = (0..W * H).map(|i| (i * 5 % colors) as u32).collect();
        let decoded = roundtrip(format, &indices, &palette[..colors]);
        let expected: Vec<u32> = indices.iter().map(|&i| palette[i as usize]).collect();
        assert_eq!(decoded, expected, "{format:?}");
    }
}

#[test]
fn cmp_flat_color_is_exact() {
    let color = pack(255, 32, 16, 0xFF);
    let input = vec![color; W * H];
    assert_eq!(roundtrip(GxFormat::CMP, &input, &[]), input);
}

#[test]
fn bit_depth_helpers() {
    assert_eq!(expand(0x1F, 5), 255);
    assert_eq!(expand(0x10, 5), 0x84);
    assert_eq!(expand(0x20, 6), 0x82);
    assert_eq!(expand(0x4, 3), 0x92);
    assert_eq!(truncate(0xFF, 5), 0x1F);
    assert_eq!(truncate(0x84, 5), 0x10);
    for v in 0..32 {
        assert_eq!(truncate(expand(v, 5), 5), v);
    }
}

#[test]
fn palette_formats() {
    let colors = [pack(255, 0, 0, 255), pack(0, 255, 0, 255), pack(0, 0, 255, 255)];
    let bytes = encode_palette(PaletteFormat::R5G6B5, &colors, AvgType::Average).unwrap();
    assert_eq!(bytes, [0xF8, 0x00, 0x07, 0xE0, 0x00, 0x1F]);
    assert_eq!(decode_palette(PaletteFormat::R5G6B5, &bytes).unwrap(), colors);

    let ia8 = encode_palette(PaletteFormat::IA8, &[gray(0x40, 0x80)], AvgType::W3c).unwrap();
    assert_eq!(ia8, [0x80, 0x40]);

    assert_eq!(
        encode_palette(PaletteFormat::RGB5A3, &[], AvgType::Average),
        Err(GxError::EmptyPalette)
    );
    assert_eq!(
        decode_palette(PaletteFormat::IA8, &[1, 2, 3]),
        Err(GxError::OddPaletteLength(3))
    );
}

#[test]
fn octree_maps_colors_to_their_leaves() {
    let mut q = OctreeQuantizer::new();
    let colors = [pack(200, 10, 10, 255), pack(10, 200, 10, 255), pack(10, 10, 200, 128)];
    for &c in &colors {
        q.add_color(c);
    }
    let palette = q.make_palette(256);
    assert_eq!(palette.len(), 3);
    for &c in &colors {
        assert_eq!(palette[q.palette_index(c).unwrap()], c);
    }
}

#[test]
fn threshold_dither_picks_nearest_leaf() {
    let (w, h) = (8, 8);
    let pixels: Vec<u32> = (0..w * h)
        .map(|i| if i % 3 == 0 { pack(255, 255, 255, 255) } else { pack(0, 0, 0, 255) })
        .collect();
    let built = build_palette(w, h, &pixels, 16, DitherType::Threshold, &Unstoppable).unwrap();
    assert_eq!(built.palette.len(), 2);
    for (&i, &p) in built.indices.iter().zip(&pixels) {
        assert_eq!(built.palette[i as usize], p);
    }
}

#[test]
fn every_dither_covers_a_gradient() {
    let (w, h) = (64, 16);
    let pixels: Vec<u32> = (0..w * h)
        .map(|i| gray((i % w * 4) as u8, 0xFF))
        .collect();
    for dither in [
        DitherType::FloydSteinberg,
        DitherType::Atkinson,
        DitherType::JarvisJudiceNinke,
        DitherType::Stucki,
        DitherType::Burkes,
        DitherType::TwoRowSierra,
        DitherType::Sierra,
        DitherType::SierraLite,
    ] {
        let built = build_palette(w, h, &pixels, 16, dither, &Unstoppable).unwrap();
        assert!(built.palette.len() <= 16, "{dither:?}");
        assert!(
            built.indices.iter().all(|&i| (i as usize) < built.palette.len()),
            "{dither:?}"
        );
    }
}
