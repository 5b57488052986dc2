// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fixed-window bit packing.
//!
//! All values are stored as `value - min` at one fixed bit width, so any
//! element can be located by arithmetic alone. Compresses worse than Simple9
//! on skewed data but never has a pathological case.
//!
//! Standalone: block sub-lists are always Simple9, since the file layout
//! carries no codec tag.
//!
//! ```text
//! [width: u8][min: u32 LE][values packed LSB-first, ceil(n·width/8) bytes]
//! ```

use crate::error::{Error, Result};

use super::cursor::ByteCursor;

/// Header size: width byte plus the u32 minimum.
pub const HEADER_LEN: usize = 5;

/// Packed width for a value span of `range` (max - min).
///
/// At least one bit; 27 and 28 bits round up to 28, anything wider to 32.
pub fn width_for(range: u32) -> u8 {
    let bits = (u32::BITS - range.leading_zeros()).max(1);
    match bits {
        27 | 28 => 28,
        b if b > 28 => 32,
        b => b as u8,
    }
}

/// Total encoded size for `count` values at `width` bits.
pub fn encoded_len(count: usize, width: u8) -> usize {
    HEADER_LEN + payload_len(count, width)
}

fn payload_len(count: usize, width: u8) -> usize {
    (count * usize::from(width)).div_ceil(8)
}

/// Append the packed encoding of `values` to `out`, returning bytes written.
pub fn encode(values: &[u32], out: &mut Vec<u8>) -> Result<usize> {
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    let width = width_for(max - min);

    let start = out.len();
    out.push(width);
    out.extend_from_slice(&min.to_le_bytes());
    out.reserve(payload_len(values.len(), width));

    let mut acc: u64 = 0;
    let mut bits: u32 = 0;
    for &v in values {
        acc |= u64::from(v - min) << bits;
        bits += u32::from(width);
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }

    Ok(out.len() - start)
}

/// Decode `count` values from `bytes`, appending to `out`. Returns bytes consumed.
pub fn decode(bytes: &[u8], count: usize, out: &mut Vec<u32>) -> Result<usize> {
    let mut cursor = ByteCursor::new(bytes);
    let width = cursor.read_u8()?;
    if !(1..=32).contains(&width) {
        return Err(Error::corrupt(format!("invalid window width {}", width)));
    }
    let min = cursor.read_u32()?;
    let needed = count
        .checked_mul(usize::from(width))
        .map(|bits| bits.div_ceil(8))
        .ok_or_else(|| Error::corrupt(format!("window count {} overflows", count)))?;
    let payload = cursor.take(needed)?;

    let width = u32::from(width);
    let mask: u64 = (1u64 << width) - 1;
    let mut acc: u64 = 0;
    let mut bits: u32 = 0;
    let mut bytes_iter = payload.iter();
    out.reserve(count);

    for _ in 0..count {
        while bits < width {
            // `needed` guarantees enough payload bytes.
            let byte = bytes_iter.next().copied().unwrap_or(0);
            acc |= u64::from(byte) << bits;
            bits += 8;
        }
        let delta = (acc & mask) as u32;
        acc >>= width;
        bits -= width;
        let value = min
            .checked_add(delta)
            .ok_or_else(|| Error::corrupt("window value overflows u32"))?;
        out.push(value);
    }

    Ok(cursor.position())
}
