// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use itertools::Itertools;

use crate::{errors::PipelineError, seq::record::SeqRecord};

// Symbols that never count as a match, even against themselves.
const SKIP: [u8; 2] = [b'-', b'*'];

/// Symmetric matrix of pairwise distances, zero on the diagonal, rows in record order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    pub names: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn new(names: Vec<String>) -> Self {
        let n = names.len();
        DistanceMatrix {
            names,
            values: vec![vec![0.0; n]; n],
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn set(&mut self, i: usize, j: usize, d: f64) {
        self.values[i][j] = d;
        self.values[j][i] = d;
    }

    pub fn row_sum(&self, i: usize) -> f64 {
        self.values[i].iter().sum()
    }

    /// Drops row and column `i`.
    pub fn remove(&mut self, i: usize) {
        self.names.remove(i);
        self.values.remove(i);
        for row in &mut self.values {
            row.remove(i);
        }
    }

    /// Looks up a distance by record name.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.get(i, j))
    }
}

/// Identity distance: one minus the fraction of alignment columns where both rows carry the same
/// residue. Columns with a gap in either row never match but still count in the denominator.
pub fn identity_distance(a: &str, b: &str) -> f64 {
    let len = a.len();
    if len == 0 {
        return 1.0;
    }
    let matches = a
        .bytes()
        .zip(b.bytes())
        .filter(|(x, y)| !SKIP.contains(x) && !SKIP.contains(y))
        .filter(|(x, y)| x.eq_ignore_ascii_case(y))
        .count();
    1.0 - matches as f64 / len as f64
}

pub fn identity_matrix(records: &[SeqRecord]) -> Result<DistanceMatrix, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::Format(String::from("No sequences in alignment")));
    }
    let names: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
    if let Some(dup) = names.iter().duplicates().next() {
        return Err(PipelineError::Format(format!("Duplicate sequence name '{}'", dup)));
    }
    let mut dm = DistanceMatrix::new(names);
    for ((i, a), (j, b)) in records.iter().enumerate().tuple_combinations() {
        dm.set(i, j, identity_distance(&a.sequence, &b.sequence));
    }
    Ok(dm)
}
