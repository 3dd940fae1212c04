// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::PipelineError;
use crate::seq::file::SeqFile;
use crate::seq::record::SeqRecord;

pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<SeqFile, PipelineError> {
    let file = File::open(path)?;
    read_fasta(BufReader::new(file))
}

pub fn read_fasta<R: BufRead>(reader: R) -> Result<SeqFile, PipelineError> {
    let mut result: SeqFile = Vec::new();
    let mut current_record: Option<SeqRecord> = None;

    for line in reader.lines() {
        let l = line?;
        let l = l.trim_end();
        if let Some(hdr) = l.strip_prefix('>') {
            if let Some(rec) = current_record.take() {
                result.push(rec);
            }
            current_record = Some(SeqRecord {
                header: hdr.trim().to_string(),
                sequence: String::new(),
            });
        } else if let Some(rec) = current_record.as_mut() {
            // append line to current record's sequence
            rec.sequence.extend(l.chars().filter(|c| !c.is_whitespace()));
        } else if !l.trim().is_empty() {
            return Err(PipelineError::Format(format!(
                "Expected FastA header ('>'), found '{}'",
                truncate(l, 40)
            )));
        }
    }
    if let Some(rec) = current_record {
        result.push(rec);
    }
    if result.is_empty() {
        return Err(PipelineError::Format(String::from("No FastA records found")));
    }
    Ok(result)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
