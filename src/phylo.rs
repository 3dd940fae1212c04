// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::{
    config::ToolsConfig,
    construct::DistanceMethod,
    distance::identity_matrix,
    errors::PipelineError,
    seq::{file::AlignmentFormat, phylip::write_phylip_file, read_alignment},
    tool::{expect_output, run_tool},
    tree::{parse_newick, TreeNode},
};

/// Loads an alignment, computes identity distances, builds the tree and ladderizes it.
pub fn distance_tree(
    alignment: &Path,
    format: AlignmentFormat,
    method: DistanceMethod,
) -> Result<TreeNode, PipelineError> {
    let records = read_alignment(alignment, format)?;
    let dm = identity_matrix(&records)?;
    let mut tree = method.build(&dm)?;
    tree.ladderize();
    info!(
        "Built {} tree with {} leaves from {}",
        method,
        tree.leaf_count(),
        alignment.display()
    );
    Ok(tree)
}

/// Where PhyML leaves its tree for a given input file.
pub fn phyml_tree_path(phylip: &Path) -> PathBuf {
    let mut name = phylip.as_os_str().to_owned();
    name.push("_phyml_tree.txt");
    PathBuf::from(name)
}

/// Converts the alignment to PHYLIP at `phylip`, runs PhyML on it and reads back the tree.
pub fn likelihood_tree(
    tools: &ToolsConfig,
    platform_id: &str,
    alignment: &Path,
    format: AlignmentFormat,
    phylip: &Path,
) -> Result<TreeNode, PipelineError> {
    let exe = tools.phyml.resolve("phyml", platform_id)?;

    let records = read_alignment(alignment, format)?;
    let count = write_phylip_file(&records, phylip)?;
    info!("Converted {} records", count);

    let output = run_tool(
        "phyml",
        &exe,
        [
            OsStr::new("-i"),
            phylip.as_os_str(),
            OsStr::new("-d"),
            OsStr::new("nt"),
            OsStr::new("--no_memory_check"),
        ],
    )?;
    let tree_path = phyml_tree_path(phylip);
    expect_output("phyml", &output, &tree_path)?;

    let text = fs::read_to_string(&tree_path)?;
    parse_newick(&text)
        .map_err(|e| PipelineError::Format(format!("{}: {}", tree_path.display(), e)))
}

#[cfg(test)]
mod tests;
