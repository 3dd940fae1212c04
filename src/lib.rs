pub mod align;
pub mod config;
pub mod construct;
pub mod distance;
pub mod errors;
pub mod fetch;
pub mod phylo;
pub mod pipeline;
pub mod platform;
pub mod render;
mod runner;
pub mod seq;
pub mod tool;
pub mod tree;

use crate::errors::PipelineError;

pub fn run() -> Result<(), PipelineError> {
    runner::run()
}
