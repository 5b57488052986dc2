// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Gap transforms applied before Simple9 packing.
//!
//! Doc ids are non-decreasing inside a block, so their differences are small.
//! Positions restart at every new doc (and every new word), so a plain gap
//! would go negative. `GapWithReset` handles that with a zero marker: every
//! real code is shifted up by one, and a `0` means "the next code is an
//! absolute value".
//!
//! ```text
//! values:  3  5  9     2  4
//! codes:   4  3  5  0  3  3
//! ```

use crate::error::{Error, Result};

use super::cursor::ByteCursor;
use super::simple9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GapMode {
    /// Values as they are.
    Raw = 0,
    /// First value, then differences. Input must be non-decreasing.
    Gap = 1,
    /// Shifted differences with zero reset markers.
    GapWithReset = 2,
}

// ============================================================================
// PURE TRANSFORMS
// ============================================================================

/// Transform values into codes for `mode`.
pub fn to_gaps(values: &[u32], mode: GapMode) -> Result<Vec<u32>> {
    match mode {
        GapMode::Raw => Ok(values.to_vec()),
        GapMode::Gap => {
            let mut codes = Vec::with_capacity(values.len());
            let mut prev = 0;
            for (i, &v) in values.iter().enumerate() {
                if i > 0 && v < prev {
                    return Err(Error::invalid(format!(
                        "gap encoding needs non-decreasing values: {} after {} at index {}",
                        v, prev, i
                    )));
                }
                codes.push(if i == 0 { v } else { v - prev });
                prev = v;
            }
            Ok(codes)
        }
        GapMode::GapWithReset => {
            let shifted = |v: u32| {
                v.checked_add(1).ok_or(Error::ValueOutOfRange {
                    value: u64::from(v) + 1,
                    max: u64::from(u32::MAX),
                })
            };
            let mut codes = Vec::with_capacity(values.len() + values.len() / 4);
            for (i, &v) in values.iter().enumerate() {
                if i == 0 {
                    codes.push(shifted(v)?);
                } else if v > values[i - 1] {
                    codes.push(shifted(v - values[i - 1])?);
                } else {
                    codes.push(0);
                    codes.push(shifted(v)?);
                }
            }
            Ok(codes)
        }
    }
}

/// Invert [`to_gaps`], producing exactly `count` values.
pub fn from_gaps(codes: &[u32], count: usize, mode: GapMode) -> Result<Vec<u32>> {
    let mut out = Vec::with_capacity(count);
    match mode {
        GapMode::Raw => out.extend_from_slice(codes),
        GapMode::Gap => {
            let mut acc: u32 = 0;
            for (i, &c) in codes.iter().enumerate() {
                acc = if i == 0 {
                    c
                } else {
                    acc.checked_add(c)
                        .ok_or_else(|| Error::corrupt("gap sum overflows u32"))?
                };
                out.push(acc);
            }
        }
        GapMode::GapWithReset => {
            // `abs` holds the last value plus one.
            let mut abs: u32 = 0;
            let mut after_reset = true;
            for (i, &c) in codes.iter().enumerate() {
                if after_reset {
                    if c == 0 {
                        return Err(Error::corrupt(format!(
                            "reset marker followed by another reset at code {}",
                            i
                        )));
                    }
                    out.push(c - 1);
                    abs = c;
                    after_reset = false;
                } else if c != 0 {
                    abs = abs
                        .checked_add(c - 1)
                        .ok_or_else(|| Error::corrupt("gap sum overflows u32"))?;
                    out.push(abs - 1);
                } else {
                    after_reset = true;
                }
                if out.len() > count {
                    break;
                }
            }
            if after_reset && !codes.is_empty() {
                return Err(Error::corrupt("gap stream ends with a reset marker"));
            }
        }
    }
    if out.len() != count {
        return Err(Error::corrupt(format!(
            "gap stream produced {} values, expected {}",
            out.len(),
            count
        )));
    }
    Ok(out)
}

// ============================================================================
// SIMPLE9-BACKED ENCODING
// ============================================================================

/// Encode `values` with `mode` and append to `out`.
///
/// Returns the number of codes emitted. `GapWithReset` may emit more codes
/// than values, so it writes that count as a u64 prefix.
pub fn encode(values: &[u32], mode: GapMode, out: &mut Vec<u8>) -> Result<usize> {
    let codes = to_gaps(values, mode)?;
    if mode == GapMode::GapWithReset {
        out.extend_from_slice(&(codes.len() as u64).to_le_bytes());
    }
    simple9::encode_into(&codes, out)?;
    Ok(codes.len())
}

/// Decode `count` values written by [`encode`], appending to `out`.
///
/// Returns the number of bytes consumed.
pub fn decode(bytes: &[u8], count: usize, mode: GapMode, out: &mut Vec<u32>) -> Result<usize> {
    match mode {
        GapMode::Raw => simple9::decode_into(bytes, count, out),
        GapMode::Gap => {
            let start = out.len();
            let consumed = simple9::decode_into(bytes, count, out)?;
            let mut acc: u32 = 0;
            for (i, slot) in out[start..].iter_mut().enumerate() {
                acc = if i == 0 {
                    *slot
                } else {
                    acc.checked_add(*slot)
                        .ok_or_else(|| Error::corrupt("gap sum overflows u32"))?
                };
                *slot = acc;
            }
            Ok(consumed)
        }
        GapMode::GapWithReset => {
            let mut cursor = ByteCursor::new(bytes);
            // Every value costs at most two codes.
            let emitted = cursor.read_len("reset code", (count as u64).saturating_mul(2))?;
            if emitted < count {
                return Err(Error::corrupt(format!(
                    "{} reset codes cannot hold {} values",
                    emitted, count
                )));
            }
            let mut codes = Vec::with_capacity(emitted);
            let consumed = simple9::decode_into(cursor.rest(), emitted, &mut codes)?;
            let values = from_gaps(&codes, count, GapMode::GapWithReset)?;
            out.extend_from_slice(&values);
            Ok(8 + consumed)
        }
    }
}
