// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;

use crate::{
    align::Aligner,
    config::load_config,
    errors::PipelineError,
    fetch::Entrez,
    pipeline::{default_alignment_name, Pipeline, TreeMethod},
    seq::file::AlignmentFormat,
    tree::{tree_lines_and_order, TreeNode},
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON); default: ~/.phylopipeconfig, then ./.phylopipeconfig
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pick tool binaries for this platform [darwin|linux|win32] instead of the host's
    #[arg(short, long, global = true)]
    platform: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download records and combine them into one multi-FastA file
    Fetch {
        /// Accessions (default: those in the configuration)
        ids: Vec<String>,
    },
    /// Align the combined FastA file with an external aligner
    Align(AlignArgs),
    /// Build a tree from an alignment and draw it
    Tree(TreeArgs),
    /// Fetch, align, build and draw, in one go
    Run {
        /// Accessions (default: those in the configuration)
        ids: Vec<String>,

        #[arg(short, long, default_value_t = Aligner::ClustalOmega)]
        aligner: Aligner,

        #[arg(short, long, default_value_t = TreeMethod::Nj)]
        method: TreeMethod,

        /// Alignment file format passed between the stages
        #[arg(short, long, default_value_t = AlignmentFormat::Clustal)]
        format: AlignmentFormat,

        /// Also print the tree as text
        #[arg(long)]
        ascii: bool,
    },
}

#[derive(Debug, Args)]
struct AlignArgs {
    #[arg(short, long, default_value_t = Aligner::ClustalOmega)]
    aligner: Aligner,

    /// Input, relative to the work directory (default: the combined file)
    #[arg(short, long)]
    input: Option<String>,

    /// Output, relative to the work directory (default: msa_<aligner>.<aln|fasta>)
    #[arg(short, long)]
    output: Option<String>,

    #[arg(short, long, default_value_t = AlignmentFormat::Clustal)]
    format: AlignmentFormat,
}

#[derive(Debug, Args)]
struct TreeArgs {
    /// Alignment, relative to the work directory
    input: String,

    #[arg(short, long, default_value_t = TreeMethod::Nj)]
    method: TreeMethod,

    /// Format of the alignment file
    #[arg(short, long, default_value_t = AlignmentFormat::Clustal)]
    format: AlignmentFormat,

    /// Base name of the PHYLIP file handed to PhyML (ml only)
    #[arg(short, long, default_value = "msa")]
    output_base: String,

    /// Also print the tree as text
    #[arg(long)]
    ascii: bool,
}

fn accessions_or_default(ids: Vec<String>, pipeline: &Pipeline) -> Vec<String> {
    if ids.is_empty() {
        pipeline.config.accessions.clone()
    } else {
        ids
    }
}

fn print_ascii(tree: &TreeNode) -> Result<(), PipelineError> {
    let (lines, _order) = tree_lines_and_order(tree)?;
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

pub fn run() -> Result<(), PipelineError> {
    env_logger::init();
    info!("Starting log");

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let mut pipeline = Pipeline::new(config);
    if let Some(platform) = &cli.platform {
        pipeline = pipeline.with_platform(platform);
    }

    match cli.command {
        Command::Fetch { ids } => {
            let ids = accessions_or_default(ids, &pipeline);
            let source = Entrez::new(&pipeline.config.entrez)?;
            let fetched = pipeline.fetch(&source, &ids)?;
            println!("{}", fetched.combined.display());
        }
        Command::Align(args) => {
            let input = args
                .input
                .unwrap_or_else(|| pipeline.config.combined_file.clone());
            let output = args
                .output
                .unwrap_or_else(|| default_alignment_name(args.aligner, args.format));
            let path = pipeline.align(args.aligner, &input, &output, args.format)?;
            println!("{}", path.display());
        }
        Command::Tree(args) => {
            let tree =
                pipeline.build_tree(&args.input, args.method, args.format, &args.output_base)?;
            if args.ascii {
                print_ascii(&tree)?;
            }
            println!("{}", pipeline.config.figure_path.display());
        }
        Command::Run {
            ids,
            aligner,
            method,
            format,
            ascii,
        } => {
            let ids = accessions_or_default(ids, &pipeline);
            let source = Entrez::new(&pipeline.config.entrez)?;
            let tree = pipeline.run(&source, &ids, aligner, method, format)?;
            if ascii {
                print_ascii(&tree)?;
            }
            println!("{}", pipeline.config.figure_path.display());
        }
    }
    Ok(())
}
