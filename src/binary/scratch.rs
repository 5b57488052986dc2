// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-worker byte buffer for raw block reads.

use crate::error::{Error, Result};

/// Grow-only read buffer.
///
/// Grows to at least double its previous size so a run of slightly larger
/// blocks does not reallocate every time. Never shrinks.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    bytes: Vec<u8>,
    growths: u64,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
            growths: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Times the buffer has grown.
    pub fn growths(&self) -> u64 {
        self.growths
    }

    /// Make room for `needed` bytes. Returns true if the buffer grew.
    pub fn ensure_capacity(&mut self, needed: usize) -> Result<bool> {
        let current = self.bytes.len();
        if needed <= current {
            return Ok(false);
        }
        let target = needed.max(current.saturating_mul(2));
        self.bytes
            .try_reserve_exact(target - current)
            .map_err(|_| Error::OutOfMemory { requested: target })?;
        self.bytes.resize(target, 0);
        self.growths += 1;
        Ok(true)
    }

    /// The first `len` bytes, growing first if needed.
    pub fn slice_mut(&mut self, len: usize) -> Result<&mut [u8]> {
        self.ensure_capacity(len)?;
        Ok(&mut self.bytes[..len])
    }

    pub fn slice(&self, len: usize) -> &[u8] {
        &self.bytes[..len.min(self.bytes.len())]
    }
}
