// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-worker query counters. Merged after a batch, never shared while live.

use std::fmt;
use std::ops::AddAssign;
use std::time::Duration;

use serde::Serialize;

use crate::store::BlockReadInfo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub queries: u64,
    pub blocks_read: u64,
    pub bytes_read: u64,
    pub postings_decoded: u64,
    pub postings_emitted: u64,
    pub timeouts: u64,
    pub scratch_growths: u64,
    pub read_micros: u64,
    pub decode_micros: u64,
    pub intersect_micros: u64,
    pub sort_micros: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&mut self, info: &BlockReadInfo) {
        self.blocks_read += 1;
        self.bytes_read += info.bytes;
        self.postings_decoded += info.postings as u64;
        self.read_micros += micros(info.read_time);
        self.decode_micros += micros(info.decode_time);
        if info.scratch_grew {
            self.scratch_growths += 1;
        }
    }

    pub fn record_intersect(&mut self, elapsed: Duration) {
        self.intersect_micros += micros(elapsed);
    }

    pub fn record_sort(&mut self, elapsed: Duration) {
        self.sort_micros += micros(elapsed);
    }

    pub fn merge(&mut self, other: &Metrics) {
        self.queries += other.queries;
        self.blocks_read += other.blocks_read;
        self.bytes_read += other.bytes_read;
        self.postings_decoded += other.postings_decoded;
        self.postings_emitted += other.postings_emitted;
        self.timeouts += other.timeouts;
        self.scratch_growths += other.scratch_growths;
        self.read_micros += other.read_micros;
        self.decode_micros += other.decode_micros;
        self.intersect_micros += other.intersect_micros;
        self.sort_micros += other.sort_micros;
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, other: Metrics) {
        self.merge(&other);
    }
}

impl AddAssign<&Metrics> for Metrics {
    fn add_assign(&mut self, other: &Metrics) {
        self.merge(other);
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} queries, {} blocks ({} bytes), {} postings decoded, {} emitted, {} timeouts; \
             read {}us, decode {}us, intersect {}us, sort {}us",
            self.queries,
            self.blocks_read,
            self.bytes_read,
            self.postings_decoded,
            self.postings_emitted,
            self.timeouts,
            self.read_micros,
            self.decode_micros,
            self.intersect_micros,
            self.sort_micros
        )
    }
}

fn micros(d: Duration) -> u64 {
    d.as_micros().min(u128::from(u64::MAX)) as u64
}
