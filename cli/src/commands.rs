use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;

use stensor::{Metadata, MmapReader, ReaderConfig, TensorOrder, Writer, WriterConfig};

use crate::print_utils::{print_file_summary, print_metadata_table, print_tensors_table};

/// Create a new progress bar with standard styling
fn create_progress_bar(len: u64) -> Result<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map_err(|e| anyhow::anyhow!("Failed to create progress style: {}", e))?
        .progress_chars("#>-");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    Ok(pb)
}

/// Print the header of a safetensors file
pub fn print_info(path: &str) -> Result<()> {
    let mapped = MmapReader::open(path)
        .with_context(|| format!("Failed to open safetensors file '{}'", path))?;
    let reader = mapped.reader();

    print_file_summary(path, mapped.file_len(), reader.header_len(), reader.len());
    if let Some(metadata) = reader.metadata() {
        println!("Metadata:");
        print_metadata_table(metadata);
    }
    if reader.is_empty() {
        println!("No tensors found in the file.");
    } else {
        print_tensors_table(
            reader
                .header()
                .tensors
                .iter()
                .map(|(name, info)| (name.as_str(), info)),
        );
    }
    Ok(())
}

/// Fully validate a safetensors file, returning its tensor count
pub fn validate_file(
    path: &str,
    max_header_size: Option<u64>,
    allow_trailing_bytes: bool,
) -> Result<usize> {
    let mut config = ReaderConfig::new().allow_trailing_bytes(allow_trailing_bytes);
    if let Some(limit) = max_header_size {
        config = config.max_header_size(limit);
    }
    let mapped = MmapReader::open_with(path, &config)
        .with_context(|| format!("Validation failed for '{}'", path))?;
    log::info!("{}: {} tensors, {} bytes", path, mapped.len(), mapped.file_len());
    Ok(mapped.len())
}

/// Merge multiple safetensors files into one
pub fn merge_files(inputs: &[String], output: &str, sort: bool) -> Result<()> {
    let pb = create_progress_bar(inputs.len() as u64)?;

    let mut sources = Vec::with_capacity(inputs.len());
    for input in inputs {
        pb.set_message(format!("Reading {}", input));
        let mapped = MmapReader::open(input)
            .with_context(|| format!("Failed to open input file '{}'", input))?;
        sources.push((input, mapped));
        pb.inc(1);
    }

    let order = if sort {
        TensorOrder::Lexicographic
    } else {
        TensorOrder::Insertion
    };
    let mut writer = Writer::with_config(WriterConfig::new().order(order));
    let mut metadata = Metadata::new();
    let mut seen_names = HashSet::new();

    for (input, mapped) in &sources {
        if let Some(extra) = mapped.metadata() {
            metadata.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        for name in mapped.names() {
            if !seen_names.insert(name.to_string()) {
                bail!(
                    "Duplicate tensor name '{}' found in file '{}'. Aborting merge.",
                    name,
                    input
                );
            }
            writer.add_view(name, mapped.tensor(name)?)?;
        }
    }
    if !metadata.is_empty() {
        writer.set_metadata(metadata);
    }

    pb.set_message(format!("Writing {}", output));
    writer
        .save(output)
        .with_context(|| format!("Failed to write output file '{}'", output))?;
    pb.finish_with_message("Done");
    Ok(())
}
