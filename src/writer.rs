//! Safetensors blob writer.
//!
//! Tensors are collected first, then laid out in one pass: offsets are
//! running totals in the configured order, the JSON header is padded with
//! spaces so the payload starts 8-byte aligned, and payloads follow
//! back-to-back.
//!
//! Blob layout: `[N: u64 LE] [HEADER JSON, N bytes] [PAYLOADS...]`

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::header::{self, Header};
use crate::models::{
    Dtype, HEADER_ALIGNMENT, LENGTH_PREFIX_SIZE, Metadata, TensorInfo,
    TensorView, check_data_len, check_name,
};
use crate::reader::TensorElement;
use crate::utils::{align_offset_to, is_little_endian, swap_endianness_in_place};

/// Order in which tensors are laid out in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorOrder {
    /// The order tensors were added in.
    #[default]
    Insertion,
    /// Sorted by name (byte-wise).
    Lexicographic,
}

/// Layout options for [`Writer`].
///
/// # Examples
///
/// ```
/// use stensor::writer::{TensorOrder, WriterConfig};
///
/// let config = WriterConfig::new()
///     .order(TensorOrder::Lexicographic)
///     .reject_empty(true);
/// assert!(config.reject_empty);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    pub order: TensorOrder,
    /// Fail with [`Error::EmptyInput`] instead of writing a blob with no tensors.
    pub reject_empty: bool,
    /// The header is padded with spaces to a multiple of this many bytes.
    pub header_alignment: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            order: TensorOrder::Insertion,
            reject_empty: false,
            header_alignment: HEADER_ALIGNMENT,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, order: TensorOrder) -> Self {
        self.order = order;
        self
    }

    pub fn reject_empty(mut self, reject: bool) -> Self {
        self.reject_empty = reject;
        self
    }

    pub fn header_alignment(mut self, alignment: u64) -> Self {
        self.header_alignment = alignment;
        self
    }
}

/// Writer for safetensors blobs.
///
/// Borrowed tensor data is not copied until the blob is emitted.
///
/// # Examples
///
/// ```no_run
/// use stensor::Writer;
///
/// let ints = [-1i32, 0, 1, 2];
/// let floats = [-1.0f32, 0.0, 1.0, 2.0];
///
/// let mut writer = Writer::new();
/// writer.add("some_ints", &[1, 4], &ints)?;
/// writer.add("some_floats", &[1, 2, 2], &floats)?;
/// writer.insert_metadata("format", "pt");
/// writer.save("sample.safetensors")?;
/// # Ok::<(), stensor::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Writer<'data> {
    config: WriterConfig,
    metadata: Option<Metadata>,
    tensors: Vec<(String, TensorView<'data>)>,
    names: HashSet<String>,
}

impl<'data> Writer<'data> {
    /// Creates a writer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replaces the `__metadata__` map.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = Some(metadata);
    }

    /// Adds one `__metadata__` key, creating the map if needed.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
    }

    /// Adds a tensor from a typed slice; the dtype is inferred from `T`.
    ///
    /// The slice is borrowed on little-endian hosts and byte-swapped into an
    /// owned buffer otherwise.
    pub fn add<T: TensorElement + bytemuck::Pod>(
        &mut self,
        name: &str,
        shape: &[u64],
        data: &'data [T],
    ) -> Result<()> {
        let bytes: &'data [u8] = bytemuck::cast_slice(data);
        let data = if is_little_endian() || !T::DTYPE.is_multi_byte() {
            Cow::Borrowed(bytes)
        } else {
            let mut swapped = bytes.to_vec();
            swap_endianness_in_place(&mut swapped, T::DTYPE.size());
            Cow::Owned(swapped)
        };
        self.add_bytes(name, shape.to_vec(), T::DTYPE, data)
    }

    /// Adds a tensor from little-endian bytes.
    pub fn add_bytes(
        &mut self,
        name: &str,
        shape: Vec<u64>,
        dtype: Dtype,
        data: impl Into<Cow<'data, [u8]>>,
    ) -> Result<()> {
        let data = data.into();
        check_data_len(name, dtype, &shape, data.len())?;
        self.push(name, TensorView::from_parts(dtype, shape, data))
    }

    /// Adds an existing view, such as one obtained from a [`Reader`](crate::Reader).
    pub fn add_view(&mut self, name: &str, view: TensorView<'data>) -> Result<()> {
        check_data_len(name, view.dtype(), view.shape(), view.data().len())?;
        self.push(name, view)
    }

    fn push(&mut self, name: &str, view: TensorView<'data>) -> Result<()> {
        check_name(name)?;
        if !self.names.insert(name.to_string()) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        self.tensors.push((name.to_string(), view));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Computes offsets and the padded header bytes.
    fn layout(&self) -> Result<(Vec<u8>, Vec<&(String, TensorView<'data>)>)> {
        if self.config.reject_empty && self.tensors.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut ordered: Vec<&(String, TensorView<'data>)> = self.tensors.iter().collect();
        if self.config.order == TensorOrder::Lexicographic {
            ordered.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut offset = 0u64;
        let mut entries = Vec::with_capacity(ordered.len());
        for (name, view) in &ordered {
            let begin = offset;
            offset += view.data().len() as u64;
            log::trace!("'{}' -> [{}, {})", name, begin, offset);
            entries.push((
                name.clone(),
                TensorInfo {
                    dtype: view.dtype(),
                    shape: view.shape().to_vec(),
                    data_offsets: (begin, offset),
                },
            ));
        }

        let header = Header {
            metadata: self.metadata.clone(),
            tensors: entries,
        };
        let mut bytes = header::encode(&header)?;
        let (_, padding) = align_offset_to(bytes.len() as u64, self.config.header_alignment);
        bytes.resize(bytes.len() + padding as usize, b' ');

        Ok((bytes, ordered))
    }

    fn payload_len(&self) -> u64 {
        self.tensors
            .iter()
            .map(|(_, view)| view.data().len() as u64)
            .sum()
    }

    /// Exact size of the blob [`finish`](Writer::finish) would produce.
    pub fn content_length(&self) -> Result<u64> {
        let (header, _) = self.layout()?;
        Ok(LENGTH_PREFIX_SIZE as u64 + header.len() as u64 + self.payload_len())
    }

    /// Writes the blob to `sink`, returning the number of bytes written.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<u64> {
        let (header, ordered) = self.layout()?;

        sink.write_u64::<LittleEndian>(header.len() as u64)?;
        sink.write_all(&header)?;
        for (_, view) in &ordered {
            sink.write_all(view.data())?;
        }
        sink.flush()?;

        let total = LENGTH_PREFIX_SIZE as u64 + header.len() as u64 + self.payload_len();
        log::debug!(
            "wrote {} tensors: header {} bytes, total {} bytes",
            ordered.len(),
            header.len(),
            total
        );
        Ok(total)
    }

    /// Serializes into a new buffer.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.content_length()? as usize);
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Writes the blob to a file, returning its size.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<u64> {
        let file = File::create(path)?;
        self.write_to(BufWriter::with_capacity(256 * 1024, file))
    }
}

/// Serializes `(name, view)` pairs in iteration order.
///
/// # Examples
///
/// ```
/// use stensor::{serialize, Dtype, Reader, TensorView};
///
/// let bytes = 7i64.to_le_bytes();
/// let view = TensorView::new(Dtype::I64, vec![], &bytes[..])?;
/// let blob = serialize([("answer", view)], None)?;
/// assert_eq!(Reader::parse(&blob)?.read_as::<i64>("answer")?, vec![7]);
/// # Ok::<(), stensor::Error>(())
/// ```
pub fn serialize<'data, I, S>(tensors: I, metadata: Option<Metadata>) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (S, TensorView<'data>)>,
    S: AsRef<str>,
{
    let mut writer = Writer::new();
    if let Some(metadata) = metadata {
        writer.set_metadata(metadata);
    }
    for (name, view) in tensors {
        writer.add_view(name.as_ref(), view)?;
    }
    writer.finish()
}
