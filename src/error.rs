use thiserror::Error;

/// Errors from the GX pixel codec, palette transcoding and palette building.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GxError {
    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("input buffer is empty")]
    EmptyInput,

    #[error("output buffer is empty")]
    EmptyOutput,

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error("{0} is not a valid palette size, expected 16, 256 or 16384")]
    InvalidPaletteSize(usize),

    #[error("palette byte length {0} is not a whole number of 16-bit entries")]
    OddPaletteLength(usize),

    #[error("palette is empty")]
    EmptyPalette,

    #[error("execution was interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxtrReadError {
    #[error("invalid parameter(s) were passed to the function")]
    InvalidParams,
    #[error("invalid texture format {0}")]
    InvalidTextureFormat(u32),
    #[error("invalid texture width, must be greater than 0")]
    InvalidWidth,
    #[error("invalid texture height, must be greater than 0")]
    InvalidHeight,
    #[error("invalid mipmap count {0}, must be greater than 0 and less than 12")]
    InvalidMipCount(u32),
    #[error("invalid palette format {0}")]
    InvalidPaletteFormat(u32),
    #[error("invalid palette width, must be greater than 0")]
    InvalidPaletteWidth,
    #[error("invalid palette height, must be greater than 0")]
    InvalidPaletteHeight,
    #[error("palette size {size} exceeds the maximum of {max} for this texture format")]
    InvalidPaletteSize { size: usize, max: usize },
    #[error("texture data ends before the header and palette are complete")]
    Truncated,
    #[error("failed to allocate memory for the palette or mipmaps")]
    OutOfMemory,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxtrDecodeError {
    #[error("indexed texture has no palette")]
    InvalidPalette,
    #[error("texture has no mipmap data")]
    InvalidMips,
    #[error("invalid texture width, must be greater than 0")]
    InvalidWidth,
    #[error("invalid texture height, must be greater than 0")]
    InvalidHeight,
    #[error("invalid mipmap count {0}, must be greater than 0 and less than 12")]
    InvalidMipCount(u32),
    #[error("failed to decode palette")]
    PaletteDecode(#[source] GxError),
    #[error("failed to decode mipmap {level}")]
    MipDecode {
        level: usize,
        #[source]
        source: GxError,
    },
    #[error("failed to allocate memory for mipmap")]
    OutOfMemory,
    #[error("execution was interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxtrEncodeError {
    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    InvalidParams {
        len: usize,
        width: u16,
        height: u16,
    },
    #[error("invalid texture width, must be greater than 0")]
    InvalidWidth,
    #[error("invalid texture height, must be greater than 0")]
    InvalidHeight,
    #[error("invalid mipmap limit {0}, must be 11 or less")]
    InvalidMipLimit(u32),
    #[error("invalid width limit {limit}, must be between 1 and {width}")]
    InvalidWidthLimit { limit: u16, width: u16 },
    #[error("invalid height limit {limit}, must be between 1 and {height}")]
    InvalidHeightLimit { limit: u16, height: u16 },
    #[error("palette formats cannot have mipmaps")]
    MipmappedPalette,
    #[error("failed to build output palette")]
    BuildPalette(#[source] GxError),
    #[error("failed to encode palette")]
    EncodePalette(#[source] GxError),
    #[error("failed to encode mipmap {level}")]
    MipEncode {
        level: usize,
        #[source]
        source: GxError,
    },
    #[error("failed to resize the image data while mipmapping")]
    Resize,
    #[error("execution was interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxtrWriteError {
    #[error("palette presence does not match the texture format")]
    InvalidParams,
    #[error("invalid texture width, must be greater than 0")]
    InvalidWidth,
    #[error("invalid texture height, must be greater than 0")]
    InvalidHeight,
    #[error("invalid mipmap count {0}, must be greater than 0 and less than 12")]
    InvalidMipCount(u32),
    #[error("invalid palette width")]
    InvalidPaletteWidth,
    #[error("invalid palette height")]
    InvalidPaletteHeight,
    #[error("palette size {size} does not fit the palette header or exceeds the maximum of {max}")]
    InvalidPaletteSize { size: usize, max: usize },
    #[error("texture has no mipmap data")]
    InvalidMips,
    #[error("execution was interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TgaReadError {
    #[error("invalid parameter(s) were passed to the function")]
    InvalidParams,
    #[error("TGAs that have a color map are not supported")]
    ColorMapPresent,
    #[error("TGAs that are not 32-bit true color are not supported")]
    NotAColorTga,
    #[error("invalid X origin, must be 0")]
    XOrigin,
    #[error("invalid Y origin, must be 0")]
    YOrigin,
    #[error("invalid width, must be greater than 0")]
    Width,
    #[error("invalid height, must be greater than 0")]
    Height,
    #[error("invalid pixel depth {0}, must be 32")]
    PixelDepth(u8),
    #[error("invalid alpha bit length {0}, must be 8")]
    AlphaBits(u8),
    #[error("TGA data ends before the header, ID or pixel data is complete")]
    Truncated,
    #[error("failed to allocate memory for data")]
    OutOfMemory,
    #[error("execution was interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TgaWriteError {
    #[error("TGAs that have a color map are not supported")]
    ColorMapPresent,
    #[error("TGAs that are not 32-bit true color are not supported")]
    NotAColorTga,
    #[error("invalid X origin, must be 0")]
    XOrigin,
    #[error("invalid Y origin, must be 0")]
    YOrigin,
    #[error("invalid width, must be greater than 0")]
    Width,
    #[error("invalid height, must be greater than 0")]
    Height,
    #[error("invalid pixel depth {0}, must be 32")]
    PixelDepth(u8),
    #[error("invalid alpha bit length {0}, must be 8")]
    AlphaBits(u8),
    #[error("pixel data length {len} does not match {width}x{height}")]
    InvalidData {
        len: usize,
        width: u16,
        height: u16,
    },
    #[error("ID length {declared} does not match the {actual} ID bytes present")]
    InvalidId { declared: u8, actual: usize },
    #[error("footer signature does not equal \"TRUEVISION-XFILE.\"")]
    InvalidSignature,
    #[error("execution was interrupted")]
    Interrupted,
}
