// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{fmt, path::PathBuf};

use clap::ValueEnum;
use log::info;

use crate::{
    align::Aligner,
    config::PipelineConfig,
    construct::DistanceMethod,
    errors::PipelineError,
    fetch::{fetch_records, FetchedRecords, RecordSource},
    phylo::{distance_tree, likelihood_tree},
    platform::Platform,
    render::render_tree,
    seq::file::AlignmentFormat,
    tree::TreeNode,
};

/// Tree-building stage: one of the distance methods, or PhyML.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TreeMethod {
    #[clap(name = "nj")]
    Nj,
    #[clap(name = "upgma")]
    Upgma,
    #[clap(name = "ml")]
    Ml,
}

impl fmt::Display for TreeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TreeMethod::Nj => "nj",
            TreeMethod::Upgma => "upgma",
            TreeMethod::Ml => "ml",
        };
        write!(f, "{}", s)
    }
}

/// `msa_<aligner>.<aln|fasta>`
pub fn default_alignment_name(aligner: Aligner, format: AlignmentFormat) -> String {
    let ext = match format {
        AlignmentFormat::Clustal => "aln",
        AlignmentFormat::FastA => "fasta",
    };
    format!("msa_{}.{}", aligner, ext)
}

/// The stages, bound to one configuration. File names passed to the stages are relative to the
/// configured work directory; the figure always goes to the configured figure path.
pub struct Pipeline {
    pub config: PipelineConfig,
    platform_id: String,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            platform_id: Platform::host_identifier().to_string(),
        }
    }

    /// Selects tool binaries as if running on `platform_id` (darwin, linux, win32).
    pub fn with_platform(mut self, platform_id: &str) -> Self {
        self.platform_id = platform_id.to_string();
        self
    }

    pub fn platform_id(&self) -> &str {
        &self.platform_id
    }

    /// Fails with a Config error if the platform identifier is not one tools can be mapped to.
    pub fn check_platform(&self) -> Result<Platform, PipelineError> {
        Platform::from_identifier(&self.platform_id)
    }

    pub fn fetch(
        &self,
        source: &dyn RecordSource,
        accessions: &[String],
    ) -> Result<FetchedRecords, PipelineError> {
        fetch_records(
            source,
            accessions,
            &self.config.work_dir,
            &self.config.combined_file,
            self.config.entrez.delay(),
        )
    }

    pub fn align(
        &self,
        aligner: Aligner,
        infile: &str,
        outfile: &str,
        format: AlignmentFormat,
    ) -> Result<PathBuf, PipelineError> {
        let output = self.config.work_path(outfile);
        aligner.align(
            &self.config.tools,
            &self.platform_id,
            &self.config.work_path(infile),
            &output,
            format,
        )?;
        Ok(output)
    }

    /// Distance-based tree: writes `<infile>.<method>.newick` to the work directory and draws the
    /// figure.
    pub fn distance_tree(
        &self,
        infile: &str,
        format: AlignmentFormat,
        method: DistanceMethod,
    ) -> Result<TreeNode, PipelineError> {
        let tree = distance_tree(&self.config.work_path(infile), format, method)?;
        let newick_path = self.config.work_path(&format!("{}.{}.newick", infile, method));
        std::fs::write(&newick_path, format!("{}\n", tree.to_newick()))?;
        info!("Wrote {}", newick_path.display());
        render_tree(&tree, &self.config.figure, &self.config.figure_path)?;
        Ok(tree)
    }

    /// Maximum-likelihood tree: converts `infile` to `<outfile>.phylip`, runs PhyML and draws its
    /// tree.
    pub fn likelihood_tree(
        &self,
        infile: &str,
        outfile: &str,
        format: AlignmentFormat,
    ) -> Result<TreeNode, PipelineError> {
        let phylip = self.config.work_path(&format!("{}.phylip", outfile));
        let tree = likelihood_tree(
            &self.config.tools,
            &self.platform_id,
            &self.config.work_path(infile),
            format,
            &phylip,
        )?;
        render_tree(&tree, &self.config.figure, &self.config.figure_path)?;
        Ok(tree)
    }

    pub fn build_tree(
        &self,
        infile: &str,
        method: TreeMethod,
        format: AlignmentFormat,
        output_base: &str,
    ) -> Result<TreeNode, PipelineError> {
        match method {
            TreeMethod::Nj => self.distance_tree(infile, format, DistanceMethod::NeighborJoining),
            TreeMethod::Upgma => self.distance_tree(infile, format, DistanceMethod::Upgma),
            TreeMethod::Ml => self.likelihood_tree(infile, output_base, format),
        }
    }

    /// Fetch, align, build and draw. The platform is checked before anything is fetched.
    pub fn run(
        &self,
        source: &dyn RecordSource,
        accessions: &[String],
        aligner: Aligner,
        method: TreeMethod,
        format: AlignmentFormat,
    ) -> Result<TreeNode, PipelineError> {
        self.check_platform()?;
        let fetched = self.fetch(source, accessions)?;
        info!("Fetched {} records", fetched.record_files.len());
        let aln_name = default_alignment_name(aligner, format);
        self.align(aligner, &self.config.combined_file, &aln_name, format)?;
        self.build_tree(&aln_name, method, format, &format!("msa_{}", aligner))
    }
}
