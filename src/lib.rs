#![forbid(unsafe_code)]

//! GameCube/Wii GX texture codecs.
//!
//! Pixels are packed `u32` words with blue in the low byte and alpha in the high byte
//! (see [`pixel`]). The tiled formats in [`GxFormat`] are decoded and encoded by
//! [`decode`] and [`encode`]; indexed formats get their palette from
//! [`build_palette`], which runs an octree quantizer and optional error diffusion.
//! [`Txtr`] and [`Tga`] read and write the two containers textures travel in.
//!
//! Every long-running operation takes a [`Stop`] and checks it between blocks or
//! rows. Pass [`Unstoppable`] when cancellation is not needed.

pub mod bits;
pub mod cmp;
pub mod codec;
pub mod dither;
pub mod error;
pub mod format;
pub mod octree;
pub mod palette;
pub mod pixel;
pub mod resize;
pub mod tga;
pub mod txtr;

pub use cmp::{CmpFit, CmpParams};
pub use codec::{decode, encode, DecodeOptions, EncodeOptions};
pub use dither::{build_palette, BuiltPalette, DitherType};
pub use error::{
    GxError, TgaReadError, TgaWriteError, TxtrDecodeError, TxtrEncodeError, TxtrReadError,
    TxtrWriteError,
};
pub use format::{GxFormat, PaletteFormat};
pub use octree::OctreeQuantizer;
pub use palette::{decode_palette, encode_palette};
pub use pixel::AvgType;
pub use resize::{ResizeEdge, ResizeFilter};
pub use tga::{Tga, TgaFooter, TgaHeader};
pub use txtr::{DecodeTxtrOptions, Mipmap, Txtr, TxtrEncodeOptions, TxtrHeader, TxtrPalette};

pub use enough::{Stop, Unstoppable};
pub use imgref::ImgVec;
