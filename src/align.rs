// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use log::info;

use crate::{
    config::ToolsConfig,
    errors::PipelineError,
    seq::file::AlignmentFormat,
    tool::{expect_output, run_tool},
};

/// The two external multiple-sequence aligners. Clustal Omega gives better alignments, MUSCLE
/// (3.8) is faster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Aligner {
    #[clap(name = "clustalo")]
    #[clap(alias = "clustal")]
    ClustalOmega,
    #[clap(name = "muscle")]
    Muscle,
}

impl fmt::Display for Aligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Aligner::ClustalOmega => "clustalo",
            Aligner::Muscle => "muscle",
        };
        write!(f, "{}", s)
    }
}

impl Aligner {
    fn command_args(&self, input: &Path, output: &Path, format: AlignmentFormat) -> Vec<OsString> {
        match self {
            Aligner::ClustalOmega => {
                let outfmt = match format {
                    AlignmentFormat::Clustal => "clu",
                    AlignmentFormat::FastA => "fa",
                };
                let mut infile = OsString::from("--infile=");
                infile.push(input);
                let mut outfile = OsString::from("--outfile=");
                outfile.push(output);
                vec![
                    infile,
                    outfile,
                    OsString::from(format!("--outfmt={}", outfmt)),
                    OsString::from("--force"),
                ]
            }
            Aligner::Muscle => {
                let mut args = vec![
                    OsString::from("-in"),
                    input.as_os_str().to_owned(),
                    OsString::from("-out"),
                    output.as_os_str().to_owned(),
                ];
                if format == AlignmentFormat::Clustal {
                    args.push(OsString::from("-clw"));
                }
                args
            }
        }
    }

    pub fn executable(
        &self,
        tools: &ToolsConfig,
        platform_id: &str,
    ) -> Result<PathBuf, PipelineError> {
        let table = match self {
            Aligner::ClustalOmega => &tools.clustalo,
            Aligner::Muscle => &tools.muscle,
        };
        table.resolve(&self.to_string(), platform_id)
    }

    /// Aligns the sequences of `input` into `output`, written in `format`. The binary is looked up
    /// for `platform_id` before anything is run.
    pub fn align(
        &self,
        tools: &ToolsConfig,
        platform_id: &str,
        input: &Path,
        output: &Path,
        format: AlignmentFormat,
    ) -> Result<(), PipelineError> {
        let exe = self.executable(tools, platform_id)?;
        if !input.is_file() {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("alignment input {} not found", input.display()),
            )));
        }
        let name = self.to_string();
        let out = run_tool(&name, &exe, self.command_args(input, output, format))?;
        expect_output(&name, &out, output)?;
        info!("Wrote {} alignment {}", format, output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Platform, ToolTable};

    #[test]
    fn clustalo_args() {
        let args = Aligner::ClustalOmega.command_args(
            Path::new("in.fasta"),
            Path::new("out.aln"),
            AlignmentFormat::Clustal,
        );
        assert_eq!(
            args,
            vec!["--infile=in.fasta", "--outfile=out.aln", "--outfmt=clu", "--force"]
        );
    }

    #[test]
    fn muscle_args() {
        let fasta = Aligner::Muscle.command_args(
            Path::new("in.fasta"),
            Path::new("out.fasta"),
            AlignmentFormat::FastA,
        );
        assert_eq!(fasta, vec!["-in", "in.fasta", "-out", "out.fasta"]);
        let clw = Aligner::Muscle.command_args(
            Path::new("in.fasta"),
            Path::new("out.aln"),
            AlignmentFormat::Clustal,
        );
        assert_eq!(clw.last().unwrap(), "-clw");
    }

    #[test]
    fn unknown_platform_fails_before_running() {
        // The input does not exist either: the platform check has to come first.
        let tools = ToolsConfig::default();
        for aligner in [Aligner::ClustalOmega, Aligner::Muscle] {
            let err = aligner
                .align(
                    &tools,
                    "plan9",
                    Path::new("/nonexistent/in.fasta"),
                    Path::new("/nonexistent/out.aln"),
                    AlignmentFormat::FastA,
                )
                .unwrap_err();
            assert!(matches!(err, PipelineError::Config(_)), "{}", err);
        }
    }

    #[test]
    fn unmapped_platform_is_missing_tool() {
        let tools = ToolsConfig {
            muscle: ToolTable::new(&[(Platform::Win32, "muscle.exe")]),
            ..ToolsConfig::default()
        };
        let err = Aligner::Muscle.executable(&tools, "linux").unwrap_err();
        assert!(matches!(err, PipelineError::MissingTool(_)));
    }
}
