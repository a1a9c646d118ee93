// Licensed under the Apache-2.0 license

//! Packing of up to eight payload bytes into the SM0D0/SM0D1 pair.
//!
//! Byte `i` of a chunk lives at bit `8 * i` of the 64-bit value formed by
//! `D1:D0`, so D0 carries bytes 0..4 and D1 bytes 4..8.

use super::command::MAX_CHUNK;

/// Pack `bytes` (at most eight; extra bytes are ignored) into `(d0, d1)`.
#[must_use]
pub fn pack(bytes: &[u8]) -> (u32, u32) {
    let mut word = [0u8; MAX_CHUNK];
    for (dst, src) in word.iter_mut().zip(bytes) {
        *dst = *src;
    }
    let value = u64::from_le_bytes(word);
    (value as u32, (value >> 32) as u32)
}

/// Unpack `out.len()` bytes (at most eight) from `(d0, d1)`.
pub fn unpack(d0: u32, d1: u32, out: &mut [u8]) {
    let value = u64::from(d0) | (u64::from(d1) << 32);
    for (dst, src) in out.iter_mut().zip(value.to_le_bytes()) {
        *dst = src;
    }
}
