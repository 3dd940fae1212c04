// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

pub mod clustal;
pub mod fasta;
pub mod file;
pub mod phylip;
pub mod record;

use std::path::Path;

use crate::errors::PipelineError;
use crate::seq::clustal::read_clustal_file;
use crate::seq::fasta::read_fasta_file;
use crate::seq::file::{AlignmentFormat, SeqFile};

/// Reads an alignment in the given format and checks that it really is one (all rows the same
/// length).
pub fn read_alignment<P: AsRef<Path>>(
    path: P,
    format: AlignmentFormat,
) -> Result<SeqFile, PipelineError> {
    let path = path.as_ref();
    let records = match format {
        AlignmentFormat::Clustal => read_clustal_file(path)?,
        AlignmentFormat::FastA => read_fasta_file(path)?,
    };
    check_aligned(&records).map_err(|msg| {
        PipelineError::Format(format!("{} ({} alignment): {}", path.display(), format, msg))
    })?;
    Ok(records)
}

fn check_aligned(records: &SeqFile) -> Result<(), String> {
    let Some(first) = records.first() else {
        return Err(String::from("No sequences found"));
    };
    let first_len = first.sequence.len();
    match records.iter().find(|rec| rec.sequence.len() != first_len) {
        Some(rec) => Err(format!(
            "sequence '{}' has length {}, expected {}",
            rec.id(),
            rec.sequence.len(),
            first_len
        )),
        None => Ok(()),
    }
}
