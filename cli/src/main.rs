//! stensor CLI: inspect, validate, and merge safetensors files

mod commands;
mod print_utils;

use anyhow::{Result, bail};
use clap::CommandFactory;
use clap::{Parser, Subcommand};
use std::path::Path;

use commands::{merge_files, print_info, validate_file};

#[derive(Parser)]
#[command(
    name = "stensor",
    version,
    about = "stensor CLI: inspect, validate, and merge safetensors files",
    long_about = "stensor CLI is a tool for inspecting, validating, and merging safetensors files.\n\nSet RUST_LOG=debug to see parser and writer diagnostics.",
    author,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show metadata and tensors of a safetensors file
    #[command(
        about = "Show metadata and tensors of a safetensors file.",
        long_about = "Display the header of a safetensors file: metadata, tensor names, shapes, dtypes, offsets, and sizes.\n\nExample:\n  stensor info model.safetensors\n"
    )]
    Info {
        /// Path to the .safetensors file
        #[arg(help = "Path to the .safetensors file to inspect")]
        file: String,
    },
    /// Validate a safetensors file
    #[command(
        about = "Validate the header and layout of a safetensors file.",
        long_about = "Parse a safetensors file and check every offset, shape, and dtype. Exits non-zero on the first error.\n\nExample:\n  stensor validate --allow-trailing-bytes model.safetensors\n"
    )]
    Validate {
        /// Path to the .safetensors file
        #[arg(help = "Path to the .safetensors file to validate")]
        file: String,
        /// Maximum accepted header size in bytes
        #[arg(long, value_name = "BYTES", help = "Maximum accepted header size in bytes (default: 100000000)")]
        max_header_size: Option<u64>,
        /// Tolerate unused bytes after the last tensor
        #[arg(long, help = "Tolerate unused bytes after the last tensor")]
        allow_trailing_bytes: bool,
    },
    /// Merge multiple safetensors files into a single file
    #[command(
        about = "Merge multiple safetensors files into a single file.",
        long_about = "Merge multiple safetensors files into a single file. Tensor names must be unique across inputs; metadata maps are combined, later files winning on key conflicts.\n\nExample:\n  stensor merge --sort merged.safetensors part1.safetensors part2.safetensors\n"
    )]
    Merge {
        /// Output .safetensors file (merged)
        #[arg(help = "Path to the output merged .safetensors file")]
        output: String,
        /// Input .safetensors files to merge
        #[arg(help = "Paths to the input .safetensors files to merge", required = true)]
        inputs: Vec<String>,
        /// Lay tensors out sorted by name
        #[arg(long, help = "Lay tensors out sorted by name instead of input order")]
        sort: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Info { file }) => {
            print_info(file)?;
        }
        Some(Commands::Validate {
            file,
            max_header_size,
            allow_trailing_bytes,
        }) => {
            let count = validate_file(file, *max_header_size, *allow_trailing_bytes)?;
            println!("{}: OK ({} tensors)", file, count);
        }
        Some(Commands::Merge { output, inputs, sort }) => {
            if inputs.is_empty() {
                bail!("No input files provided for merge.");
            }
            if Path::new(output).exists() {
                bail!("Output file '{}' already exists. Please remove it or choose a different name.", output);
            }
            merge_files(inputs, output, *sort)?;
            println!("Successfully merged {} files into {}", inputs.len(), output);
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
