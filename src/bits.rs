//! Channel bit-depth conversion.
//!
//! Expansion replicates the top bits of an n-bit value into the low bits, so the
//! largest n-bit value maps to 255 and 0 stays 0. Truncation keeps the top n bits.

#[inline]
pub fn expand3(v: u32) -> u8 {
    let v = v & 0x7;
    ((v << 5) | (v << 2) | (v >> 1)) as u8
}

#[inline]
pub fn expand4(v: u32) -> u8 {
    let v = v & 0xF;
    ((v << 4) | v) as u8
}

#[inline]
pub fn expand5(v: u32) -> u8 {
    let v = v & 0x1F;
    ((v << 3) | (v >> 2)) as u8
}

#[inline]
pub fn expand6(v: u32) -> u8 {
    let v = v & 0x3F;
    ((v << 2) | (v >> 4)) as u8
}

/// Expand an `n`-bit channel value to 8 bits. `n` outside 3..=6 returns the low byte.
#[inline]
pub fn expand(v: u32, n: u32) -> u8 {
    match n {
        3 => expand3(v),
        4 => expand4(v),
        5 => expand5(v),
        6 => expand6(v),
        _ => v as u8,
    }
}

/// Take the top `n` bits of an 8-bit channel value (`n` in 1..=8).
#[inline]
pub fn truncate(v: u8, n: u32) -> u32 {
    debug_assert!((1..=8).contains(&n));
    u32::from(v) >> (8 - n)
}
