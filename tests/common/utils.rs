// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::{cell::RefCell, fs, path::Path};

use phylopipe::{
    config::PipelineConfig,
    errors::PipelineError,
    fetch::RecordSource,
    platform::{Platform, ToolTable},
};

/// Serves synthetic FastA records: every accession gets the same backbone with a few
/// accession-specific substitutions, so that the records are already aligned.
#[allow(dead_code)]
pub struct SyntheticSource {
    pub calls: RefCell<Vec<String>>,
    pub fail_on: Option<String>,
}

#[allow(dead_code)]
impl SyntheticSource {
    pub fn new() -> Self {
        SyntheticSource {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn failing_on(accession: &str) -> Self {
        SyntheticSource {
            calls: RefCell::new(Vec::new()),
            fail_on: Some(accession.to_string()),
        }
    }
}

const BACKBONE: &str = "ACGTTGCAACGGTACCTTAGGCATCGATCGGATCCAAGTTCGAACTG";

#[allow(dead_code)]
pub fn synthetic_sequence(index: usize) -> String {
    let mut seq: Vec<u8> = BACKBONE.bytes().collect();
    // Record i differs from the backbone at i positions, spread along the sequence.
    for k in 0..index {
        let pos = (k * 7 + index * 3) % seq.len();
        seq[pos] = match seq[pos] {
            b'A' => b'G',
            b'G' => b'A',
            b'C' => b'T',
            _ => b'C',
        };
    }
    String::from_utf8(seq).expect("ascii")
}

impl RecordSource for SyntheticSource {
    fn fetch_fasta(&self, accession: &str) -> Result<String, PipelineError> {
        let index = self.calls.borrow().len();
        self.calls.borrow_mut().push(accession.to_string());
        if self.fail_on.as_deref() == Some(accession) {
            return Err(PipelineError::Network(format!("{}: connection reset", accession)));
        }
        Ok(format!(
            ">{} synthetic record {}\n{}\n",
            accession,
            index,
            synthetic_sequence(index)
        ))
    }
}

#[allow(dead_code)]
pub fn config_in(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.work_dir = dir.join("data");
    config.figure_path = dir.join("figure").join("tree.png");
    config.entrez.delay_ms = 0;
    config
}

#[allow(dead_code)]
pub fn all_platforms(path: &Path) -> ToolTable {
    let path = path.to_string_lossy().into_owned();
    ToolTable::new(&[
        (Platform::Darwin, path.as_str()),
        (Platform::Linux, path.as_str()),
        (Platform::Win32, path.as_str()),
    ])
}

/// Writes an executable shell script standing in for an external tool.
#[cfg(unix)]
#[allow(dead_code)]
pub fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

/// MUSCLE stand-in: the input is already aligned, so copy it through.
#[allow(dead_code)]
pub const FAKE_MUSCLE: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    -in) in="$2"; shift ;;
    -out) out="$2"; shift ;;
  esac
  shift
done
cp "$in" "$out"
"#;

/// Clustal Omega stand-in that always "produces" the given file.
#[allow(dead_code)]
pub fn fake_clustalo(canned: &Path) -> String {
    format!(
        r#"
for a in "$@"; do
  case "$a" in
    --outfile=*) out="${{a#--outfile=}}" ;;
  esac
done
cp '{}' "$out"
"#,
        canned.display()
    )
}

/// PhyML stand-in: NJ-like star tree over whatever names the PHYLIP file holds.
#[allow(dead_code)]
pub const FAKE_PHYML: &str = r#"
[ "$1" = "-i" ] || exit 2
names=$(awk 'NR == 1 { n = $1; next } NR <= n + 1 { printf "%s%s:0.1", sep, $1; sep = "," }' "$2")
[ -n "$names" ] || exit 3
echo "($names);" > "$2_phyml_tree.txt"
"#;
