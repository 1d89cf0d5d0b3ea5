//! Command-line interface for content-forge.

mod commands;

pub use commands::{
    load_product_file, parse_cli, run, run_with_cli, sample_product, Cli, Commands,
    GenerateArgs, SampleArgs,
};
