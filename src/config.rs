// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    errors::PipelineError,
    platform::{Platform, ToolTable},
};

pub const CONFIG_FILE_NAME: &str = ".phylopipeconfig";

pub const DEFAULT_ACCESSIONS: [&str; 8] = [
    "MT298507.1",
    "HQ954792.1",
    "MK013995.1",
    "KJ128666.1",
    "JX218056.1",
    "KP403684.1",
    "HQ536294.1",
    "MK013988.1",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding every intermediate file (records, alignments, trees).
    pub work_dir: PathBuf,
    /// The rendered tree; overwritten by every tree-building run.
    pub figure_path: PathBuf,
    pub combined_file: String,
    pub accessions: Vec<String>,
    pub entrez: EntrezConfig,
    pub tools: ToolsConfig,
    pub figure: FigureConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntrezConfig {
    pub base_url: String,
    pub email: Option<String>,
    pub tool: String,
    pub api_key: Option<String>,
    /// Pause between successive fetches [ms]
    pub delay_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub clustalo: ToolTable,
    pub muscle: ToolTable,
    pub phyml: ToolTable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: u32,
    pub row_height: u32,
    pub font_size: u32,
    pub line_color: String,
    pub label_color: String,
    pub background: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            work_dir: PathBuf::from("static/data/sauvegardes"),
            figure_path: PathBuf::from("static/figure/tree.png"),
            combined_file: String::from("multifasta.fasta"),
            accessions: DEFAULT_ACCESSIONS.iter().map(|s| s.to_string()).collect(),
            entrez: EntrezConfig::default(),
            tools: ToolsConfig::default(),
            figure: FigureConfig::default(),
        }
    }
}

impl Default for EntrezConfig {
    fn default() -> Self {
        EntrezConfig {
            base_url: String::from("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi"),
            email: None,
            tool: String::from(env!("CARGO_PKG_NAME")),
            api_key: None,
            delay_ms: 1000,
            timeout_secs: 120,
        }
    }
}

impl EntrezConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        ToolsConfig {
            clustalo: ToolTable::new(&[
                (Platform::Darwin, "static/tools/MacOS/clustal-omega-1.2.3-macosx"),
                (Platform::Linux, "static/tools/Linux/clustalo-1.2.4-Ubuntu-x86_64"),
                (
                    Platform::Win32,
                    "static/tools/Windows/clustal-omega-1.2.2-win64/clustalo.exe",
                ),
            ]),
            muscle: ToolTable::new(&[
                (Platform::Darwin, "static/tools/MacOS/muscle3.8.31_i86darwin64"),
                (Platform::Linux, "static/tools/Linux/muscle3.8.31_i86linux64"),
                (Platform::Win32, "static/tools/Windows/muscle3.8.31_i86win32.exe"),
            ]),
            phyml: ToolTable::new(&[
                (
                    Platform::Darwin,
                    "static/tools/MacOS/PhyML-3.1/PhyML-3.1_macOS-MountainLion",
                ),
                (Platform::Linux, "static/tools/Linux/PhyML-3.1/PhyML-3.1_linux64"),
                (Platform::Win32, "static/tools/Windows/PhyML-3.1/PhyML-3.1_win32.exe"),
            ]),
        }
    }
}

impl Default for FigureConfig {
    fn default() -> Self {
        FigureConfig {
            width: 800,
            row_height: 28,
            font_size: 14,
            line_color: String::from("#000000"),
            label_color: String::from("#000000"),
            background: String::from("#FFFFFF"),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn work_path(&self, fname: &str) -> PathBuf {
        self.work_dir.join(fname)
    }

    pub fn combined_path(&self) -> PathBuf {
        self.work_path(&self.combined_file)
    }
}

pub fn find_config() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let path = PathBuf::from(home).join(CONFIG_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Explicit path wins; otherwise the first config file found, otherwise defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig, PipelineError> {
    match explicit {
        Some(path) => PipelineConfig::from_file(path),
        None => match find_config() {
            Some(path) => PipelineConfig::from_file(&path),
            None => Ok(PipelineConfig::default()),
        },
    }
}
