/// Assembles a blob from a raw header string and payload, bypassing the
/// writer so malformed layouts can be crafted.
pub fn raw_blob(header: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = (header.len() as u64).to_le_bytes().to_vec();
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// JSON for a single tensor entry.
pub fn entry(name: &str, dtype: &str, shape: &[u64], begin: u64, end: u64) -> String {
    let shape = shape
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#""{}":{{"dtype":"{}","shape":[{}],"data_offsets":[{},{}]}}"#,
        name, dtype, shape, begin, end
    )
}

/// A JSON header object from pre-rendered entries.
pub fn header(entries: &[String]) -> String {
    format!("{{{}}}", entries.join(","))
}
