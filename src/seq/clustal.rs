// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::PipelineError;
use crate::seq::file::SeqFile;
use crate::seq::record::SeqRecord;

// Header lines written by the aligners we drive (and a few others that share the layout).
const HEADERS: [&str; 3] = ["CLUSTAL", "MUSCLE", "PROBCONS"];

pub fn read_clustal_file<P: AsRef<Path>>(path: P) -> Result<SeqFile, PipelineError> {
    let file = File::open(path)?;
    read_clustal(BufReader::new(file))
}

pub fn read_clustal<R: BufRead>(reader: R) -> Result<SeqFile, PipelineError> {
    let mut order: Vec<String> = Vec::new();
    let mut sequences: HashMap<String, String> = HashMap::new();
    let mut seen_header = false;

    for line in reader.lines() {
        let l = line?;
        let trimmed = l.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        if !seen_header {
            if HEADERS.iter().any(|h| trimmed.starts_with(h)) {
                seen_header = true;
                continue;
            }
            return Err(PipelineError::Format(String::from(
                "Missing CLUSTAL header line",
            )));
        }
        if trimmed.starts_with('#') {
            continue;
        }
        // Conservation lines start with blanks.
        if trimmed
            .chars()
            .next()
            .map(|c| c.is_whitespace())
            .unwrap_or(false)
        {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let name = fields
            .next()
            .ok_or_else(|| PipelineError::Format(String::from("Missing sequence id")))?;
        let fragment = fields
            .next()
            .ok_or_else(|| PipelineError::Format(String::from("Missing sequence fragment")))?;
        let entry = sequences.entry(name.to_string()).or_insert_with(|| {
            order.push(name.to_string());
            String::new()
        });
        entry.push_str(fragment);
    }

    if order.is_empty() {
        return Err(PipelineError::Format(String::from("No sequences found")));
    }

    let mut result: SeqFile = Vec::new();
    for name in order {
        let sequence = sequences.remove(&name).unwrap_or_default();
        result.push(SeqRecord {
            header: name,
            sequence,
        });
    }

    Ok(result)
}
