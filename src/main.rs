// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use phylopipe::errors::PipelineError;

fn main() -> Result<(), PipelineError> {
    phylopipe::run()
}
