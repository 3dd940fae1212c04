// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{fmt, mem};

use clap::ValueEnum;
use log::warn;

use crate::{distance::DistanceMatrix, errors::PipelineError, tree::TreeNode};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DistanceMethod {
    #[clap(name = "nj")]
    NeighborJoining,
    #[clap(name = "upgma")]
    Upgma,
}

impl fmt::Display for DistanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DistanceMethod::NeighborJoining => "nj",
            DistanceMethod::Upgma => "upgma",
        };
        write!(f, "{}", s)
    }
}

impl DistanceMethod {
    pub fn build(&self, dm: &DistanceMatrix) -> Result<TreeNode, PipelineError> {
        match self {
            DistanceMethod::NeighborJoining => neighbor_joining(dm),
            DistanceMethod::Upgma => upgma(dm),
        }
    }
}

fn leaves(dm: &DistanceMatrix) -> Result<Vec<TreeNode>, PipelineError> {
    if dm.is_empty() {
        return Err(PipelineError::Format(String::from(
            "Cannot build a tree from an empty distance matrix",
        )));
    }
    Ok(dm.names.iter().map(|n| TreeNode::leaf(n, 0.0)).collect())
}

// Takes the clade at `i` out of the working list, leaving an empty placeholder behind.
fn take(clades: &mut [TreeNode], i: usize) -> TreeNode {
    mem::replace(&mut clades[i], TreeNode::internal(Vec::new()))
}

/// Saitou & Nei neighbor-joining. Returns an unrooted tree drawn from its last internal node.
/// Of several pairs with the same Q value, the first in lower-triangle scan order is joined.
pub fn neighbor_joining(dm: &DistanceMatrix) -> Result<TreeNode, PipelineError> {
    let mut clades = leaves(dm)?;
    let mut dm = dm.clone();

    if clades.len() == 1 {
        return Ok(take(&mut clades, 0));
    }
    if clades.len() == 2 {
        let d = dm.get(1, 0);
        let mut a = take(&mut clades, 1);
        let mut b = take(&mut clades, 0);
        a.branch_length = Some(d / 2.0);
        b.branch_length = Some(d - d / 2.0);
        return Ok(TreeNode::internal(vec![a, b]));
    }

    let mut inner_pos = 0;
    let mut inner_count = 0;
    while dm.len() > 2 {
        let n = dm.len();
        let node_dist: Vec<f64> = (0..n).map(|i| dm.row_sum(i) / (n - 2) as f64).collect();

        let (mut min_i, mut min_j) = (0, 1);
        let mut min_q = dm.get(1, 0) - node_dist[1] - node_dist[0];
        for i in 1..n {
            for j in 0..i {
                let q = dm.get(i, j) - node_dist[i] - node_dist[j];
                if q < min_q {
                    min_q = q;
                    min_i = i;
                    min_j = j;
                }
            }
        }

        let d_ij = dm.get(min_i, min_j);
        let mut clade1 = take(&mut clades, min_i);
        let mut clade2 = take(&mut clades, min_j);
        let len1 = (d_ij + node_dist[min_i] - node_dist[min_j]) / 2.0;
        clade1.branch_length = Some(len1);
        clade2.branch_length = Some(d_ij - len1);
        clades[min_j] = TreeNode::internal(vec![clade1, clade2]);

        for k in 0..n {
            if k != min_i && k != min_j {
                let d = (dm.get(min_i, k) + dm.get(min_j, k) - d_ij) / 2.0;
                dm.set(min_j, k, d);
            }
        }
        inner_count += 1;
        dm.names[min_j] = format!("Inner{}", inner_count);
        clades.remove(min_i);
        dm.remove(min_i);
        inner_pos = if min_i < min_j { min_j - 1 } else { min_j };
    }

    // Hang the remaining clade off the last join.
    let d = dm.get(1, 0);
    let other_pos = 1 - inner_pos;
    let mut other = take(&mut clades, other_pos);
    let mut root = take(&mut clades, inner_pos);
    other.branch_length = Some(d);
    root.branch_length = None;
    root.children.push(other);

    clamp_negative_lengths(&mut root);
    Ok(root)
}

fn clamp_negative_lengths(node: &mut TreeNode) {
    if let Some(len) = node.branch_length {
        if len < 0.0 {
            warn!(
                "Negative branch length {:.5} above {} set to 0",
                len,
                node.name.as_deref().unwrap_or("internal node")
            );
            node.branch_length = Some(0.0);
        }
    }
    for child in &mut node.children {
        clamp_negative_lengths(child);
    }
}

/// UPGMA (average linkage, weighted by cluster size); the result is rooted and ultrametric.
/// Of several closest pairs, the last in lower-triangle scan order is merged.
pub fn upgma(dm: &DistanceMatrix) -> Result<TreeNode, PipelineError> {
    let mut clades = leaves(dm)?;
    let mut dm = dm.clone();
    let mut heights = vec![0.0_f64; clades.len()];
    let mut sizes = vec![1_usize; clades.len()];

    while dm.len() > 1 {
        let n = dm.len();
        let (mut min_i, mut min_j) = (1, 0);
        let mut min_d = dm.get(1, 0);
        for i in 1..n {
            for j in 0..i {
                if dm.get(i, j) <= min_d {
                    min_d = dm.get(i, j);
                    min_i = i;
                    min_j = j;
                }
            }
        }

        let height = min_d / 2.0;
        let mut clade1 = take(&mut clades, min_i);
        let mut clade2 = take(&mut clades, min_j);
        clade1.branch_length = Some((height - heights[min_i]).max(0.0));
        clade2.branch_length = Some((height - heights[min_j]).max(0.0));
        clades[min_j] = TreeNode::internal(vec![clade1, clade2]);

        let (si, sj) = (sizes[min_i] as f64, sizes[min_j] as f64);
        for k in 0..n {
            if k != min_i && k != min_j {
                let d = (si * dm.get(min_i, k) + sj * dm.get(min_j, k)) / (si + sj);
                dm.set(min_j, k, d);
            }
        }
        heights[min_j] = height;
        sizes[min_j] += sizes[min_i];
        heights.remove(min_i);
        sizes.remove(min_i);
        clades.remove(min_i);
        dm.remove(min_i);
    }

    let mut root = take(&mut clades, 0);
    root.branch_length = None;
    Ok(root)
}
