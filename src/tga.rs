//! Uncompressed 32-bit true-color TGA.
//!
//! Only the subset GX textures round-trip through is handled: no color map, image type
//! 2, 32 bits per pixel with 8 alpha bits. Pixels are little-endian BGRA words, which
//! is exactly the packed pixel layout used by the codecs.

use byteorder::{ByteOrder, LittleEndian};
use enough::Stop;
use imgref::ImgVec;

use crate::error::{TgaReadError, TgaWriteError};

pub const HEADER_SIZE: usize = 18;
pub const FOOTER_SIZE: usize = 26;
pub const FOOTER_SIGNATURE: &[u8; 18] = b"TRUEVISION-XFILE.\0";

/// Uncompressed true-color image type.
pub const IMAGE_TYPE_COLOR: u8 = 2;

const DESC_ALPHA_MASK: u8 = 0x0F;
const DESC_FLIP_X: u8 = 0x10;
const DESC_TOP_ORIGIN: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorMapSpec {
    pub first_entry_index: u16,
    pub length: u16,
    pub entry_size: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageSpec {
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub pixel_depth: u8,
    pub descriptor: u8,
}

impl ImageSpec {
    pub fn alpha_bits(&self) -> u8 {
        self.descriptor & DESC_ALPHA_MASK
    }

    /// Rows are stored right to left.
    pub fn flip_x(&self) -> bool {
        self.descriptor & DESC_FLIP_X != 0
    }

    /// The first stored row is the top of the image.
    pub fn top_origin(&self) -> bool {
        self.descriptor & DESC_TOP_ORIGIN != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: u8,
    pub color_map: ColorMapSpec,
    pub image: ImageSpec,
}

/// Header checks shared by reading and writing.
#[derive(Debug, Clone, Copy)]
enum HeaderFault {
    ColorMap,
    NotColor,
    XOrigin,
    YOrigin,
    Width,
    Height,
    PixelDepth(u8),
    AlphaBits(u8),
}

impl HeaderFault {
    fn read_error(self) -> TgaReadError {
        match self {
            HeaderFault::ColorMap => TgaReadError::ColorMapPresent,
            HeaderFault::NotColor => TgaReadError::NotAColorTga,
            HeaderFault::XOrigin => TgaReadError::XOrigin,
            HeaderFault::YOrigin => TgaReadError::YOrigin,
            HeaderFault::Width => TgaReadError::Width,
            HeaderFault::Height => TgaReadError::Height,
            HeaderFault::PixelDepth(d) => TgaReadError::PixelDepth(d),
            HeaderFault::AlphaBits(b) => TgaReadError::AlphaBits(b),
        }
    }

    fn write_error(self) -> TgaWriteError {
        match self {
            HeaderFault::ColorMap => TgaWriteError::ColorMapPresent,
            HeaderFault::NotColor => TgaWriteError::NotAColorTga,
            HeaderFault::XOrigin => TgaWriteError::XOrigin,
            HeaderFault::YOrigin => TgaWriteError::YOrigin,
            HeaderFault::Width => TgaWriteError::Width,
            HeaderFault::Height => TgaWriteError::Height,
            HeaderFault::PixelDepth(d) => TgaWriteError::PixelDepth(d),
            HeaderFault::AlphaBits(b) => TgaWriteError::AlphaBits(b),
        }
    }
}

impl TgaHeader {
    /// Header for a `width` x `height` image stored top row first.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            id_length: 0,
            color_map_type: 0,
            image_type: IMAGE_TYPE_COLOR,
            color_map: ColorMapSpec::default(),
            image: ImageSpec {
                x_origin: 0,
                y_origin: 0,
                width,
                height,
                pixel_depth: 32,
                descriptor: DESC_TOP_ORIGIN | 8,
            },
        }
    }

    fn parse(b: &[u8; HEADER_SIZE]) -> Self {
        Self {
            id_length: b[0],
            color_map_type: b[1],
            image_type: b[2],
            color_map: ColorMapSpec {
                first_entry_index: LittleEndian::read_u16(&b[3..5]),
                length: LittleEndian::read_u16(&b[5..7]),
                entry_size: b[7],
            },
            image: ImageSpec {
                x_origin: LittleEndian::read_u16(&b[8..10]),
                y_origin: LittleEndian::read_u16(&b[10..12]),
                width: LittleEndian::read_u16(&b[12..14]),
                height: LittleEndian::read_u16(&b[14..16]),
                pixel_depth: b[16],
                descriptor: b[17],
            },
        }
    }

    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut b = [0u8; HEADER_SIZE];
        b[0] = self.id_length;
        b[1] = self.color_map_type;
        b[2] = self.image_type;
        LittleEndian::write_u16(&mut b[3..5], self.color_map.first_entry_index);
        LittleEndian::write_u16(&mut b[5..7], self.color_map.length);
        b[7] = self.color_map.entry_size;
        LittleEndian::write_u16(&mut b[8..10], self.image.x_origin);
        LittleEndian::write_u16(&mut b[10..12], self.image.y_origin);
        LittleEndian::write_u16(&mut b[12..14], self.image.width);
        LittleEndian::write_u16(&mut b[14..16], self.image.height);
        b[16] = self.image.pixel_depth;
        b[17] = self.image.descriptor;
        b
    }

    fn check(&self) -> Result<(), HeaderFault> {
        self.check_prefix(HEADER_SIZE)
    }

    /// Field checks in file order, skipping fields that end past `available` bytes.
    fn check_prefix(&self, available: usize) -> Result<(), HeaderFault> {
        let (map, img) = (&self.color_map, &self.image);
        let checks = [
            (2, self.color_map_type != 0, HeaderFault::ColorMap),
            (3, self.image_type != IMAGE_TYPE_COLOR, HeaderFault::NotColor),
            (5, map.first_entry_index != 0, HeaderFault::ColorMap),
            (7, map.length != 0, HeaderFault::ColorMap),
            (8, map.entry_size != 0, HeaderFault::ColorMap),
            (10, img.x_origin != 0, HeaderFault::XOrigin),
            (12, img.y_origin != 0, HeaderFault::YOrigin),
            (14, img.width == 0, HeaderFault::Width),
            (16, img.height == 0, HeaderFault::Height),
            (17, img.pixel_depth != 32, HeaderFault::PixelDepth(img.pixel_depth)),
            (18, img.alpha_bits() != 8, HeaderFault::AlphaBits(img.alpha_bits())),
        ];
        match checks
            .into_iter()
            .find(|(end, bad, _)| *end <= available && *bad)
        {
            Some((_, _, fault)) => Err(fault),
            None => Ok(()),
        }
    }

    /// Offset of stored pixel for image pixel (x, y).
    fn stored_index(&self, x: usize, y: usize) -> usize {
        let (w, h) = (usize::from(self.image.width), usize::from(self.image.height));
        let fy = if self.image.top_origin() { y } else { h - 1 - y };
        let fx = if self.image.flip_x() { w - 1 - x } else { x };
        fy * w + fx
    }
}

/// New-format TGA footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TgaFooter {
    pub ext_offset: u32,
    pub dev_offset: u32,
    pub signature: [u8; 18],
}

impl Default for TgaFooter {
    fn default() -> Self {
        Self {
            ext_offset: 0,
            dev_offset: 0,
            signature: *FOOTER_SIGNATURE,
        }
    }
}

/// Whether `bytes` ends with the new-format footer signature.
pub fn is_new_format(bytes: &[u8]) -> bool {
    bytes.ends_with(FOOTER_SIGNATURE)
}

#[derive(Debug, Clone)]
pub struct Tga {
    pub header: TgaHeader,
    pub id: Vec<u8>,
    /// Image pixels, top row first regardless of how the file stores them.
    pub pixels: ImgVec<u32>,
    pub footer: Option<TgaFooter>,
}

impl Tga {
    /// Wrap an image in a top-origin header with a new-format footer. `None` if a
    /// dimension is zero or does not fit in 16 bits.
    pub fn from_pixels(pixels: ImgVec<u32>) -> Option<Self> {
        let width = u16::try_from(pixels.width()).ok().filter(|&w| w > 0)?;
        let height = u16::try_from(pixels.height()).ok().filter(|&h| h > 0)?;
        Some(Self {
            header: TgaHeader::new(width, height),
            id: Vec::new(),
            pixels,
            footer: Some(TgaFooter::default()),
        })
    }

    pub fn read(bytes: &[u8], stop: &dyn Stop) -> Result<Self, TgaReadError> {
        if bytes.is_empty() {
            return Err(TgaReadError::InvalidParams);
        }
        // a short header still reports the first bad field it does contain
        let mut head = [0u8; HEADER_SIZE];
        let present = bytes.len().min(HEADER_SIZE);
        head[..present].copy_from_slice(&bytes[..present]);
        let header = TgaHeader::parse(&head);
        header
            .check_prefix(present)
            .map_err(HeaderFault::read_error)?;
        if present < HEADER_SIZE {
            return Err(TgaReadError::Truncated);
        }

        let id_end = HEADER_SIZE + usize::from(header.id_length);
        let id = bytes
            .get(HEADER_SIZE..id_end)
            .ok_or(TgaReadError::Truncated)?
            .to_vec();

        let (w, h) = (
            usize::from(header.image.width),
            usize::from(header.image.height),
        );
        let data = bytes
            .get(id_end..id_end + w * h * 4)
            .ok_or(TgaReadError::Truncated)?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(w * h)
            .map_err(|_| TgaReadError::OutOfMemory)?;
        for y in 0..h {
            stop.check().map_err(|_| TgaReadError::Interrupted)?;
            for x in 0..w {
                let at = header.stored_index(x, y) * 4;
                pixels.push(LittleEndian::read_u32(&data[at..at + 4]));
            }
        }

        let footer = if is_new_format(bytes) && bytes.len() >= FOOTER_SIZE {
            let f = &bytes[bytes.len() - FOOTER_SIZE..];
            let mut signature = [0u8; 18];
            signature.copy_from_slice(&f[8..]);
            Some(TgaFooter {
                ext_offset: LittleEndian::read_u32(&f[0..4]),
                dev_offset: LittleEndian::read_u32(&f[4..8]),
                signature,
            })
        } else {
            None
        };

        tracing::debug!(
            width = w,
            height = h,
            new_format = footer.is_some(),
            "read TGA"
        );
        Ok(Self {
            header,
            id,
            pixels: ImgVec::new(pixels, w, h),
            footer,
        })
    }

    /// Serialize, storing pixels in the orientation the header describes.
    pub fn write(&self, stop: &dyn Stop) -> Result<Vec<u8>, TgaWriteError> {
        let header = self.header;
        header.check().map_err(HeaderFault::write_error)?;
        let (w, h) = (
            usize::from(header.image.width),
            usize::from(header.image.height),
        );
        if self.pixels.width() != w || self.pixels.height() != h {
            return Err(TgaWriteError::InvalidData {
                len: self.pixels.buf().len(),
                width: header.image.width,
                height: header.image.height,
            });
        }
        if self.id.len() != usize::from(header.id_length) {
            return Err(TgaWriteError::InvalidId {
                declared: header.id_length,
                actual: self.id.len(),
            });
        }
        if let Some(footer) = &self.footer {
            if &footer.signature != FOOTER_SIGNATURE {
                return Err(TgaWriteError::InvalidSignature);
            }
        }

        let footer_len = if self.footer.is_some() { FOOTER_SIZE } else { 0 };
        let mut out = Vec::with_capacity(HEADER_SIZE + self.id.len() + w * h * 4 + footer_len);
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&self.id);

        let start = out.len();
        out.resize(start + w * h * 4, 0);
        let data = &mut out[start..];
        for (y, row) in self.pixels.rows().enumerate() {
            stop.check().map_err(|_| TgaWriteError::Interrupted)?;
            for (x, &p) in row.iter().enumerate() {
                let at = header.stored_index(x, y) * 4;
                LittleEndian::write_u32(&mut data[at..at + 4], p);
            }
        }

        if let Some(footer) = &self.footer {
            let mut f = [0u8; FOOTER_SIZE];
            LittleEndian::write_u32(&mut f[0..4], footer.ext_offset);
            LittleEndian::write_u32(&mut f[4..8], footer.dev_offset);
            f[8..].copy_from_slice(&footer.signature);
            out.extend_from_slice(&f);
        }

        tracing::debug!(bytes = out.len(), "wrote TGA");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enough::Unstoppable;

    fn sample() -> Tga {
        let px: Vec<u32> = (0..6).map(|i| 0xFF00_0000 | i).collect();
        Tga::from_pixels(ImgVec::new(px, 3, 2)).unwrap()
    }

    #[test]
    fn header_layout() {
        let bytes = sample().write(&Unstoppable).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 6 * 4 + FOOTER_SIZE);
        assert_eq!(&bytes[..3], &[0, 0, IMAGE_TYPE_COLOR]);
        assert_eq!(&bytes[12..14], &[3, 0]);
        assert_eq!(&bytes[14..16], &[2, 0]);
        assert_eq!(bytes[16], 32);
        assert_eq!(bytes[17], 0x28);
        assert_eq!(&bytes[18..22], &[0, 0, 0, 0xFF]);
        assert!(is_new_format(&bytes));
    }

    #[test]
    fn bottom_origin_rows_are_reversed() {
        let mut tga = sample();
        tga.header.image.descriptor = 8;
        let bytes = tga.write(&Unstoppable).unwrap();
        // first stored row is the bottom image row
        assert_eq!(LittleEndian::read_u32(&bytes[18..22]), 0xFF00_0003);
        let back = Tga::read(&bytes, &Unstoppable).unwrap();
        assert_eq!(back.pixels.buf(), tga.pixels.buf());
    }

    #[test]
    fn read_validation_order() {
        let mut bytes = sample().write(&Unstoppable).unwrap();
        assert!(matches!(Tga::read(&[], &Unstoppable), Err(TgaReadError::InvalidParams)));
        assert!(matches!(
            Tga::read(&bytes[..10], &Unstoppable),
            Err(TgaReadError::Truncated)
        ));
        bytes[16] = 24;
        assert!(matches!(
            Tga::read(&bytes, &Unstoppable),
            Err(TgaReadError::PixelDepth(24))
        ));
        bytes[8] = 1;
        assert!(matches!(Tga::read(&bytes, &Unstoppable), Err(TgaReadError::XOrigin)));
        bytes[5] = 1;
        assert!(matches!(
            Tga::read(&bytes, &Unstoppable),
            Err(TgaReadError::ColorMapPresent)
        ));
        bytes[2] = 10;
        assert!(matches!(Tga::read(&bytes, &Unstoppable), Err(TgaReadError::NotAColorTga)));
    }

    #[test]
    fn short_header_reports_bad_fields_before_truncation() {
        let read = |b: &[u8]| Tga::read(b, &Unstoppable);
        assert!(matches!(read(&[0, 1, 2, 0, 0, 0, 0, 0]), Err(TgaReadError::ColorMapPresent)));
        assert!(matches!(read(&[0, 1]), Err(TgaReadError::ColorMapPresent)));
        assert!(matches!(read(&[0, 0, 3]), Err(TgaReadError::NotAColorTga)));
        assert!(matches!(read(&[0, 0, 2, 0, 0, 4]), Err(TgaReadError::Truncated)));
        assert!(matches!(read(&[0, 0, 2, 0, 0, 4, 0]), Err(TgaReadError::ColorMapPresent)));
        assert!(matches!(
            read(&[0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(TgaReadError::Width)
        ));
        let mut head = TgaHeader::new(2, 2).to_bytes();
        head[17] = 0x24;
        assert!(matches!(read(&head[..17]), Err(TgaReadError::Truncated)));
        assert!(matches!(read(&head), Err(TgaReadError::AlphaBits(4))));
    }

    #[test]
    fn write_validation() {
        let mut tga = sample();
        tga.header.id_length = 2;
        assert!(matches!(
            tga.write(&Unstoppable),
            Err(TgaWriteError::InvalidId {
                declared: 2,
                actual: 0
            })
        ));
        tga.id = vec![1, 2];
        tga.header.image.width = 4;
        assert!(matches!(
            tga.write(&Unstoppable),
            Err(TgaWriteError::InvalidData { .. })
        ));
        tga.header.image.width = 3;
        tga.footer = Some(TgaFooter {
            signature: [0; 18],
            ..TgaFooter::default()
        });
        assert!(matches!(
            tga.write(&Unstoppable),
            Err(TgaWriteError::InvalidSignature)
        ));
    }

    #[test]
    fn old_format_has_no_footer() {
        let mut tga = sample();
        tga.footer = None;
        let bytes = tga.write(&Unstoppable).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 24);
        assert!(!is_new_format(&bytes));
        assert!(Tga::read(&bytes, &Unstoppable).unwrap().footer.is_none());
    }
}
