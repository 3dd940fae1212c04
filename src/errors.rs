// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::{io, process::ExitStatus};

use thiserror::Error;

// Every stage stops at the first error and hands it back unchanged; main() returns it, so the
// process exits non-zero.

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing tool: {0}")]
    MissingTool(String),

    #[error("{tool} failed ({status}): {stderr}")]
    Subprocess {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Format error: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Render error: {0}")]
    Render(String),
}

impl PipelineError {
    pub fn subprocess(tool: &str, status: Option<ExitStatus>, stderr: &[u8]) -> Self {
        let status = match status {
            Some(s) => s.to_string(),
            None => String::from("no output produced"),
        };
        PipelineError::Subprocess {
            tool: tool.to_string(),
            status,
            stderr: stderr_tail(stderr),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Config(e.to_string())
    }
}

// Tools like PhyML are chatty; only the end of stderr is worth carrying around.
fn stderr_tail(stderr: &[u8]) -> String {
    const MAX_LINES: usize = 5;
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(MAX_LINES);
    lines[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr = b"a\nb\n\nc\nd\ne\nf\ng\n";
        assert_eq!(stderr_tail(stderr), "c | d | e | f | g");
    }

    #[test]
    fn io_errors_convert() {
        let e: PipelineError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, PipelineError::Io(_)));
        assert_eq!(e.to_string(), "I/O error: gone");
    }
}
