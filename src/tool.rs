// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{
    ffi::OsStr,
    io,
    path::Path,
    process::{Command, Output, Stdio},
};

use log::{debug, info};

use crate::errors::PipelineError;

/// Runs an external tool to completion, capturing its output. A tool that cannot be started is
/// a `MissingTool`; one that exits non-zero is a `Subprocess` error carrying the end of stderr.
pub fn run_tool<I, S>(name: &str, exe: &Path, args: I) -> Result<Output, PipelineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(exe);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    info!("Running {} ({})", name, exe.display());
    debug!("{:?}", cmd);

    let output = cmd.output().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            PipelineError::MissingTool(format!("{} ({}): {}", name, exe.display(), e))
        }
        _ => PipelineError::Io(e),
    })?;
    debug!("{} stdout: {}", name, String::from_utf8_lossy(&output.stdout));
    debug!("{} stderr: {}", name, String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(PipelineError::subprocess(
            name,
            Some(output.status),
            &output.stderr,
        ));
    }
    Ok(output)
}

/// Checks that a tool that exited cleanly actually left its output behind.
pub fn expect_output(name: &str, output: &Output, path: &Path) -> Result<(), PipelineError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::subprocess(name, None, &output.stderr))
    }
}
