// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::LazyLock,
    thread,
    time::Duration,
};

use log::{info, warn};
use regex::Regex;
use reqwest::blocking::Client;

use crate::{config::EntrezConfig, errors::PipelineError};

/// Anything that can hand back the FastA text of a nucleotide record.
pub trait RecordSource {
    fn fetch_fasta(&self, accession: &str) -> Result<String, PipelineError>;
}

/// NCBI E-utilities `efetch` against the nucleotide database.
pub struct Entrez {
    client: Client,
    config: EntrezConfig,
}

impl Entrez {
    pub fn new(config: &EntrezConfig) -> Result<Self, PipelineError> {
        if config.email.is_none() {
            warn!("No contact e-mail configured for Entrez; NCBI may throttle or block requests");
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Entrez {
            client,
            config: config.clone(),
        })
    }

    fn query(&self, accession: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", String::from("nucleotide")),
            ("id", accession.to_string()),
            ("rettype", String::from("fasta")),
            ("retmode", String::from("text")),
            ("tool", self.config.tool.clone()),
        ];
        if let Some(email) = &self.config.email {
            params.push(("email", email.clone()));
        }
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }
}

impl RecordSource for Entrez {
    fn fetch_fasta(&self, accession: &str) -> Result<String, PipelineError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query(accession))
            .send()
            .map_err(|e| PipelineError::Network(format!("{}: {}", accession, e)))?;
        let response = response
            .error_for_status()
            .map_err(|e| PipelineError::Network(format!("{}: {}", accession, e)))?;
        Ok(response.text()?)
    }
}

/// Files left behind by a fetch: one per accession (input order) plus the concatenation.
#[derive(Debug)]
pub struct FetchedRecords {
    pub record_files: Vec<PathBuf>,
    pub combined: PathBuf,
}

static ACCESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]+$").unwrap());

/// Accessions end up as file names, so only plain identifier characters are accepted.
pub fn validate_accession(accession: &str) -> Result<(), PipelineError> {
    if ACCESSION_RE.is_match(accession) && !accession.chars().all(|c| c == '.') {
        Ok(())
    } else {
        Err(PipelineError::Config(format!(
            "Invalid accession identifier '{}'",
            accession
        )))
    }
}

pub fn record_path(work_dir: &Path, accession: &str) -> PathBuf {
    work_dir.join(format!("{}.fasta", accession))
}

/// Fetches every accession in order, one file each, pausing `delay` between requests, then
/// concatenates the files into `combined_name`. The first failure aborts the batch; files
/// already written stay on disk.
pub fn fetch_records(
    source: &dyn RecordSource,
    accessions: &[String],
    work_dir: &Path,
    combined_name: &str,
    delay: Duration,
) -> Result<FetchedRecords, PipelineError> {
    if accessions.is_empty() {
        return Err(PipelineError::Config(String::from("No accessions to fetch")));
    }
    for acc in accessions {
        validate_accession(acc)?;
    }
    fs::create_dir_all(work_dir)?;

    let mut record_files = Vec::with_capacity(accessions.len());
    for (i, acc) in accessions.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        let mut text = source.fetch_fasta(acc)?;
        if !text.trim_start().starts_with('>') {
            return Err(PipelineError::Format(format!(
                "Response for {} is not a FastA record",
                acc
            )));
        }
        if !text.ends_with('\n') {
            text.push('\n');
        }
        let path = record_path(work_dir, acc);
        info!("Writing: {}", path.display());
        fs::write(&path, text)?;
        record_files.push(path);
    }

    let combined = work_dir.join(combined_name);
    concatenate(&record_files, &combined)?;
    info!(
        "Combined {} records into {}",
        record_files.len(),
        combined.display()
    );
    Ok(FetchedRecords {
        record_files,
        combined,
    })
}

fn concatenate(inputs: &[PathBuf], output: &Path) -> Result<(), PipelineError> {
    let mut out = File::create(output)?;
    for path in inputs {
        out.write_all(&fs::read(path)?)?;
    }
    out.flush()?;
    Ok(())
}
