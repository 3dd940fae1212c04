// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::seq::record::SeqRecord;

// For our purposes, a sequence file is just a Vec of sequence records.
//

pub type SeqFile = Vec<SeqRecord>;

/// Text formats an alignment file can be in. The tag handed to a tree builder must match the
/// actual file content.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentFormat {
    #[clap(name = "clustal")]
    #[clap(alias = "c")]
    Clustal,
    #[clap(name = "fasta")]
    #[clap(alias = "f")]
    FastA,
}

impl fmt::Display for AlignmentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlignmentFormat::Clustal => "clustal",
            AlignmentFormat::FastA => "fasta",
        };
        write!(f, "{}", s)
    }
}
