// Utility functions for printing safetensors headers as tables
use comfy_table::{Cell, ContentArrangement, Row, Table, presets::UTF8_FULL};
use humansize::{DECIMAL, format_size};
use stensor::{Metadata, TensorInfo};

pub fn format_shape(shape: &[u64]) -> String {
    if shape.is_empty() {
        "(scalar)".to_string()
    } else {
        format!(
            "[{}]",
            shape.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        )
    }
}

pub fn print_file_summary(path: &str, file_len: usize, header_len: usize, count: usize) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(Row::from(vec![Cell::new("File"), Cell::new(path)]));
    table.add_row(Row::from(vec![
        Cell::new("Size"),
        Cell::new(format_size(file_len as u64, DECIMAL)),
    ]));
    table.add_row(Row::from(vec![
        Cell::new("Header"),
        Cell::new(format!("{} bytes", header_len)),
    ]));
    table.add_row(Row::from(vec![Cell::new("Tensors"), Cell::new(count)]));
    println!("{}", table);
}

pub fn print_metadata_table(metadata: &Metadata) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Key", "Value"]);
    for (key, value) in metadata {
        table.add_row(Row::from(vec![Cell::new(key), Cell::new(value)]));
    }
    println!("{}", table);
}

pub fn print_tensors_table<'a>(tensors: impl IntoIterator<Item = (&'a str, &'a TensorInfo)>) {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Name", "Shape", "DType", "Offsets", "Size"]);
    for (i, (name, info)) in tensors.into_iter().enumerate() {
        let (begin, end) = info.data_offsets;
        table.add_row(Row::from(vec![
            Cell::new(i),
            Cell::new(name),
            Cell::new(format_shape(&info.shape)),
            Cell::new(info.dtype),
            Cell::new(format!("{}..{}", begin, end)),
            Cell::new(format_size(info.span(), DECIMAL)),
        ]));
    }
    println!("{}", table);
}
