// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Frequency-rank recoding for word ids.
//!
//! Word ids inside a block follow a Zipf-like distribution: a few words carry
//! most of the postings. Replacing each id by its frequency rank turns the
//! common ones into tiny integers that Simple9 packs many to a word.
//!
//! ```text
//! [min: u32][max: u32][rank_to_item: u32 × (max - min + 1)][Simple9 ranks]
//! ```
//!
//! Ranks are ordered by descending frequency, ties by ascending id, so the
//! codebook is deterministic for a given input.

use crate::error::{Error, Result};

use super::cursor::ByteCursor;
use super::layout::MAX_CODEBOOK_LEN;
use super::simple9;

/// Recode `items` and append to `out`. Returns bytes written.
pub fn encode(items: &[u32], out: &mut Vec<u8>) -> Result<usize> {
    let start = out.len();
    let min = items.iter().copied().min().unwrap_or(0);
    let max = items.iter().copied().max().unwrap_or(0);

    let range = max - min;
    if range > simple9::MAX_VALUE {
        return Err(Error::ValueOutOfRange {
            value: u64::from(range),
            max: u64::from(simple9::MAX_VALUE),
        });
    }
    let len = range as usize + 1;
    if len as u64 > MAX_CODEBOOK_LEN {
        return Err(Error::ValueOutOfRange {
            value: len as u64,
            max: MAX_CODEBOOK_LEN,
        });
    }

    let mut histogram = vec![0u64; len];
    for &item in items {
        histogram[(item - min) as usize] += 1;
    }

    // Stable sort keeps ascending ids among equal frequencies.
    let mut rank_to_item: Vec<u32> = (0..len as u32).collect();
    rank_to_item.sort_by(|&a, &b| histogram[b as usize].cmp(&histogram[a as usize]));

    let mut item_to_rank = vec![0u32; len];
    for (rank, &item) in rank_to_item.iter().enumerate() {
        item_to_rank[item as usize] = rank as u32;
    }

    out.extend_from_slice(&min.to_le_bytes());
    out.extend_from_slice(&max.to_le_bytes());
    out.reserve(len * 4);
    for &item in &rank_to_item {
        out.extend_from_slice(&item.to_le_bytes());
    }

    let ranks: Vec<u32> = items
        .iter()
        .map(|&item| item_to_rank[(item - min) as usize])
        .collect();
    simple9::encode_into(&ranks, out)?;

    Ok(out.len() - start)
}

/// Decode `count` items, appending to `out`. Returns bytes consumed.
pub fn decode(bytes: &[u8], count: usize, out: &mut Vec<u32>) -> Result<usize> {
    let mut cursor = ByteCursor::new(bytes);
    let min = cursor.read_u32()?;
    let max = cursor.read_u32()?;
    if max < min {
        return Err(Error::corrupt(format!(
            "codebook bounds inverted: min {} > max {}",
            min, max
        )));
    }
    let len = u64::from(max - min) + 1;
    if len > MAX_CODEBOOK_LEN {
        return Err(Error::corrupt(format!(
            "codebook of {} entries exceeds limit {}",
            len, MAX_CODEBOOK_LEN
        )));
    }
    let len = len as usize;

    let table = cursor.take(len * 4)?;
    let mut rank_to_item = Vec::with_capacity(len);
    for chunk in table.chunks_exact(4) {
        let item = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if item > max - min {
            return Err(Error::corrupt(format!(
                "codebook entry {} outside range {}",
                item,
                max - min
            )));
        }
        rank_to_item.push(item + min);
    }

    let rest = cursor.rest();
    let start = out.len();
    let consumed = simple9::decode_into(rest, count, out)?;
    for slot in &mut out[start..] {
        *slot = *rank_to_item.get(*slot as usize).ok_or_else(|| {
            Error::corrupt(format!("rank {} outside codebook of {}", slot, len))
        })?;
    }

    Ok(8 + len * 4 + consumed)
}
