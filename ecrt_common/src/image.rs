//! Little-endian process-image accessors.
//!
//! The process image is the raw byte buffer exchanged with the bus once per
//! cycle. Field devices encode every PDO entry little-endian regardless of
//! host byte order, so all accessors here go through `from_le_bytes` /
//! `to_le_bytes` explicitly instead of overlaying structs on the buffer.
//!
//! Offsets are resolved once by the registration layer and validated at
//! configuration time. A read past the end of the image yields zero and a
//! write past the end is dropped; the cyclic path never panics.

use serde::{Deserialize, Serialize};

/// Byte offset plus bit position of one PDO entry inside the process image.
///
/// Bit-granular entries (single status/control bits packed into a byte)
/// carry a non-zero `bit`; word-sized entries use `bit == 0` and the plain
/// byte offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdoOffset {
    /// Byte offset into the process image.
    pub byte: usize,
    /// Bit position within that byte (0..8).
    #[serde(default)]
    pub bit: u8,
}

impl PdoOffset {
    /// Word-aligned offset (bit 0).
    #[inline]
    pub const fn at(byte: usize) -> Self {
        Self { byte, bit: 0 }
    }

    /// Bit-granular offset.
    #[inline]
    pub const fn bit(byte: usize, bit: u8) -> Self {
        Self { byte, bit }
    }
}

// ─── Reads ──────────────────────────────────────────────────────────

/// Read a single bit.
#[inline]
pub fn read_bit(pd: &[u8], off: PdoOffset) -> bool {
    match pd.get(off.byte) {
        Some(b) => (b >> (off.bit & 7)) & 1 != 0,
        None => false,
    }
}

/// Read an unsigned byte.
#[inline]
pub fn read_u8(pd: &[u8], off: usize) -> u8 {
    pd.get(off).copied().unwrap_or(0)
}

/// Read a signed byte.
#[inline]
pub fn read_i8(pd: &[u8], off: usize) -> i8 {
    read_u8(pd, off) as i8
}

/// Read a little-endian u16.
#[inline]
pub fn read_u16(pd: &[u8], off: usize) -> u16 {
    match pd.get(off..off + 2) {
        Some(b) => u16::from_le_bytes([b[0], b[1]]),
        None => 0,
    }
}

/// Read a little-endian i16.
#[inline]
pub fn read_i16(pd: &[u8], off: usize) -> i16 {
    read_u16(pd, off) as i16
}

/// Read a little-endian u32.
#[inline]
pub fn read_u32(pd: &[u8], off: usize) -> u32 {
    match pd.get(off..off + 4) {
        Some(b) => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        None => 0,
    }
}

/// Read a little-endian i32.
#[inline]
pub fn read_i32(pd: &[u8], off: usize) -> i32 {
    read_u32(pd, off) as i32
}

/// Read a little-endian u64.
#[inline]
pub fn read_u64(pd: &[u8], off: usize) -> u64 {
    match pd.get(off..off + 8) {
        Some(b) => u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        None => 0,
    }
}

// ─── Writes ─────────────────────────────────────────────────────────

/// Write a single bit, leaving the rest of the byte untouched.
#[inline]
pub fn write_bit(pd: &mut [u8], off: PdoOffset, value: bool) {
    if let Some(b) = pd.get_mut(off.byte) {
        let mask = 1u8 << (off.bit & 7);
        if value {
            *b |= mask;
        } else {
            *b &= !mask;
        }
    }
}

/// Write an unsigned byte.
#[inline]
pub fn write_u8(pd: &mut [u8], off: usize, value: u8) {
    if let Some(b) = pd.get_mut(off) {
        *b = value;
    }
}

/// Write a little-endian u16.
#[inline]
pub fn write_u16(pd: &mut [u8], off: usize, value: u16) {
    if let Some(b) = pd.get_mut(off..off + 2) {
        b.copy_from_slice(&value.to_le_bytes());
    }
}

/// Write a little-endian i16.
#[inline]
pub fn write_i16(pd: &mut [u8], off: usize, value: i16) {
    write_u16(pd, off, value as u16);
}

/// Write a little-endian u32.
#[inline]
pub fn write_u32(pd: &mut [u8], off: usize, value: u32) {
    if let Some(b) = pd.get_mut(off..off + 4) {
        b.copy_from_slice(&value.to_le_bytes());
    }
}

/// Write a little-endian i32.
#[inline]
pub fn write_i32(pd: &mut [u8], off: usize, value: i32) {
    write_u32(pd, off, value as u32);
}

/// Write a little-endian u64.
#[inline]
pub fn write_u64(pd: &mut [u8], off: usize, value: u64) {
    if let Some(b) = pd.get_mut(off..off + 8) {
        b.copy_from_slice(&value.to_le_bytes());
    }
}

/// Write a little-endian IEEE 754 single (REAL PDO entries).
#[inline]
pub fn write_f32(pd: &mut [u8], off: usize, value: f32) {
    write_u32(pd, off, value.to_bits());
}

// ─── Tests ──────────────────────────────────────────────────────────
