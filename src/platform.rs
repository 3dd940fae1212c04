// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{collections::BTreeMap, fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// Host platforms for which bundled tool binaries exist. The identifiers are the ones the tool
/// bundle directories are named after, not Rust's `std::env::consts::OS` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Darwin,
    Linux,
    Win32,
}

impl Platform {
    pub fn from_identifier(id: &str) -> Result<Platform, PipelineError> {
        match id {
            "darwin" => Ok(Platform::Darwin),
            "linux" => Ok(Platform::Linux),
            "win32" => Ok(Platform::Win32),
            other => Err(PipelineError::Config(format!(
                "Unsupported platform '{}' (expected darwin, linux or win32)",
                other
            ))),
        }
    }

    /// Identifier of the platform we were compiled for ("macos" -> "darwin", etc.).
    pub fn host_identifier() -> &'static str {
        match std::env::consts::OS {
            "macos" => "darwin",
            "linux" => "linux",
            "windows" => "win32",
            other => other,
        }
    }

    pub fn current() -> Result<Platform, PipelineError> {
        Platform::from_identifier(Platform::host_identifier())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Darwin => "darwin",
            Platform::Linux => "linux",
            Platform::Win32 => "win32",
        };
        write!(f, "{}", s)
    }
}

/// Where one external tool lives, per platform. A platform with no entry has no binary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolTable(pub BTreeMap<Platform, PathBuf>);

impl ToolTable {
    pub fn new(entries: &[(Platform, &str)]) -> Self {
        ToolTable(
            entries
                .iter()
                .map(|(p, path)| (*p, PathBuf::from(path)))
                .collect(),
        )
    }

    pub fn path_for(&self, tool: &str, platform: Platform) -> Result<PathBuf, PipelineError> {
        self.0.get(&platform).cloned().ok_or_else(|| {
            PipelineError::MissingTool(format!("no {} binary configured for {}", tool, platform))
        })
    }

    /// Resolves the binary for a raw platform identifier; unknown identifiers are a configuration
    /// error, raised before anything is spawned.
    pub fn resolve(&self, tool: &str, platform_id: &str) -> Result<PathBuf, PipelineError> {
        let platform = Platform::from_identifier(platform_id)?;
        self.path_for(tool, platform)
    }
}
