// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::PipelineError;
use crate::seq::record::SeqRecord;

// Strict PHYLIP: names live in a fixed 10-column field.
const NAME_WIDTH: usize = 10;
const CHUNK: usize = 10;
const CHUNKS_PER_LINE: usize = 5;

/// Writes `records` as strict interleaved PHYLIP and returns how many records were written.
pub fn write_phylip_file<P: AsRef<Path>>(
    records: &[SeqRecord],
    path: P,
) -> Result<usize, PipelineError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    let count = write_phylip(records, &mut out)?;
    out.flush()?;
    Ok(count)
}

pub fn write_phylip<W: Write>(records: &[SeqRecord], out: &mut W) -> Result<usize, PipelineError> {
    let Some(first) = records.first() else {
        return Err(PipelineError::Format(String::from("No records to convert")));
    };
    let aln_len = first.sequence.chars().count();
    if aln_len == 0 {
        return Err(PipelineError::Format(String::from("Empty alignment")));
    }

    let names = phylip_names(records)?;
    let rows: Vec<Vec<char>> = records.iter().map(|r| r.sequence.chars().collect()).collect();
    if let Some(rec) = records.iter().zip(&rows).find(|(_, r)| r.len() != aln_len) {
        return Err(PipelineError::Format(format!(
            "Sequence '{}' differs in length from the first one",
            rec.0.id()
        )));
    }

    writeln!(out, " {} {}", records.len(), aln_len)?;
    let line_len = CHUNK * CHUNKS_PER_LINE;
    let mut start = 0;
    while start < aln_len {
        if start > 0 {
            writeln!(out)?;
        }
        let end = (start + line_len).min(aln_len);
        for (name, row) in names.iter().zip(&rows) {
            if start == 0 {
                write!(out, "{:<width$}", name, width = NAME_WIDTH)?;
            } else {
                write!(out, "{}", " ".repeat(NAME_WIDTH))?;
            }
            for chunk in row[start..end].chunks(CHUNK) {
                write!(out, " {}", chunk.iter().collect::<String>())?;
            }
            writeln!(out)?;
        }
        start = end;
    }
    Ok(records.len())
}

// Names are the record ids, made Newick-safe (the tool echoes them into its tree) and cut to the
// name field width. Cutting must not make two names collide.
fn phylip_names(records: &[SeqRecord]) -> Result<Vec<String>, PipelineError> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(records.len());
    for rec in records {
        let name: String = rec
            .id()
            .chars()
            .map(|c| match c {
                '(' | ')' | '[' | ']' | ',' | ':' | ';' | '\'' => '_',
                c if c.is_whitespace() => '_',
                c => c,
            })
            .take(NAME_WIDTH)
            .collect();
        if !seen.insert(name.clone()) {
            return Err(PipelineError::Format(format!(
                "Repeated name '{}' after truncation to {} characters",
                name, NAME_WIDTH
            )));
        }
        names.push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(header: &str, seq: &str) -> SeqRecord {
        SeqRecord {
            header: header.to_string(),
            sequence: seq.to_string(),
        }
    }

    #[test]
    fn single_block() {
        let records = vec![rec("MT298507.1 desc", "ACGTACGTACGTA"), rec("x:y", "ACGTACGTACGT-")];
        let mut buf = Vec::new();
        let count = write_phylip(&records, &mut buf).unwrap();
        assert_eq!(count, 2);
        let text = String::from_utf8(buf).unwrap();
        insta::assert_snapshot!(text, @r"
         2 13
        MT298507.1 ACGTACGTAC GTA
        x_y        ACGTACGTAC GT-
        ");
    }

    #[test]
    fn interleaved_blocks() {
        let seq = "A".repeat(60);
        let records = vec![rec("s1", &seq), rec("s2", &seq)];
        let mut buf = Vec::new();
        write_phylip(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], " 2 60");
        assert!(lines[1].starts_with("s1         AAAAAAAAAA"));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], format!("{} {}", " ".repeat(10), "A".repeat(10)));
    }

    #[test]
    fn truncation_collision() {
        let records = vec![rec("ABCDEFGHIJ1", "AC"), rec("ABCDEFGHIJ2", "AC")];
        let err = write_phylip(&records, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Format(_)));
    }
}
