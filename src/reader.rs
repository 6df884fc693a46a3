//! Zero-copy reader for safetensors blobs.
//!
//! Parsing happens in one validating pass: the length prefix is checked
//! against the buffer and the configured ceiling, the JSON header is decoded,
//! and every entry's offsets are cross-checked against its shape and against
//! each other. Only then are views handed out, each one a sub-slice of the
//! source buffer.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use half::{bf16, f16};
use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::header::{self, Header};
use crate::models::{
    DEFAULT_MAX_HEADER_SIZE, Dtype, LENGTH_PREFIX_SIZE, Metadata, TensorInfo, TensorView,
    cast_bytes,
};

/// Element types that can be decoded from (and written as) tensor data.
pub trait TensorElement: Copy + Send + Sync + 'static {
    /// The dtype tag this element type maps to.
    const DTYPE: Dtype;

    /// Decodes one element from exactly `DTYPE.size()` little-endian bytes.
    fn from_le_bytes(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($t:ty, $d:expr) => {
        impl TensorElement for $t {
            const DTYPE: Dtype = $d;

            fn from_le_bytes(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(bytes);
                <$t>::from_le_bytes(buf)
            }
        }
    };
}

impl_element!(f64, Dtype::F64);
impl_element!(f32, Dtype::F32);
impl_element!(f16, Dtype::F16);
impl_element!(bf16, Dtype::BF16);
impl_element!(i64, Dtype::I64);
impl_element!(i32, Dtype::I32);
impl_element!(i16, Dtype::I16);
impl_element!(i8, Dtype::I8);
impl_element!(u64, Dtype::U64);
impl_element!(u32, Dtype::U32);
impl_element!(u16, Dtype::U16);
impl_element!(u8, Dtype::U8);

impl TensorElement for bool {
    const DTYPE: Dtype = Dtype::Bool;

    fn from_le_bytes(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Parsing limits and policies.
///
/// # Examples
///
/// ```
/// use stensor::ReaderConfig;
///
/// let config = ReaderConfig::new()
///     .max_header_size(1 << 20)
///     .allow_trailing_bytes(true);
/// assert_eq!(config.max_header_size, 1 << 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Largest header length accepted before any allocation.
    pub max_header_size: u64,
    /// Accept payload bytes after the last tensor instead of failing.
    pub allow_trailing_bytes: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            allow_trailing_bytes: false,
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_header_size(mut self, limit: u64) -> Self {
        self.max_header_size = limit;
        self
    }

    pub fn allow_trailing_bytes(mut self, allow: bool) -> Self {
        self.allow_trailing_bytes = allow;
        self
    }
}

/// A validated header together with where the payload starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    header: Header,
    index: HashMap<String, usize>,
    header_len: usize,
    data_start: usize,
}

impl Layout {
    fn parse(buffer: &[u8], config: &ReaderConfig) -> Result<Self> {
        let available = buffer.len() as u64;
        if buffer.len() < LENGTH_PREFIX_SIZE {
            return Err(Error::TruncatedHeader {
                needed: LENGTH_PREFIX_SIZE as u64,
                available,
            });
        }

        let n = LittleEndian::read_u64(&buffer[..LENGTH_PREFIX_SIZE]);
        if n > config.max_header_size {
            return Err(Error::HeaderTooLarge {
                size: n,
                limit: config.max_header_size,
            });
        }
        let needed = (LENGTH_PREFIX_SIZE as u64).saturating_add(n);
        if needed > available {
            return Err(Error::TruncatedHeader { needed, available });
        }

        // Bounded by buffer.len() from here on.
        let header_len = n as usize;
        let data_start = LENGTH_PREFIX_SIZE + header_len;
        let header = header::decode(&buffer[LENGTH_PREFIX_SIZE..data_start])?;

        let payload_len = (buffer.len() - data_start) as u64;
        validate_offsets(&header, payload_len, config)?;

        let index = header
            .tensors
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();

        log::debug!(
            "parsed header: {} tensors, header {} bytes, payload {} bytes",
            header.tensors.len(),
            header_len,
            payload_len
        );

        Ok(Self {
            header,
            index,
            header_len,
            data_start,
        })
    }

    fn info(&self, name: &str) -> Result<&TensorInfo> {
        self.index
            .get(name)
            .map(|&i| &self.header.tensors[i].1)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    fn bytes<'data>(&self, buffer: &'data [u8], info: &TensorInfo) -> &'data [u8] {
        let (begin, end) = info.data_offsets;
        &buffer[self.data_start + begin as usize..self.data_start + end as usize]
    }

    fn view<'data>(&self, buffer: &'data [u8], info: &TensorInfo) -> TensorView<'data> {
        TensorView::from_parts(
            info.dtype,
            info.shape.clone(),
            Cow::Borrowed(self.bytes(buffer, info)),
        )
    }
}

/// Checks every entry's offsets against its shape, the payload bounds and
/// the other entries.
fn validate_offsets(header: &Header, payload_len: u64, config: &ReaderConfig) -> Result<()> {
    let mut ranges: Vec<(u64, u64, &str)> = Vec::with_capacity(header.tensors.len());

    for (name, info) in &header.tensors {
        let (begin, end) = info.data_offsets;
        if begin > end {
            return Err(Error::InvalidOffsets {
                name: name.clone(),
                reason: format!("begin {} is past end {}", begin, end),
            });
        }
        if end > payload_len {
            return Err(Error::InvalidOffsets {
                name: name.clone(),
                reason: format!("end {} exceeds payload length {}", end, payload_len),
            });
        }
        let expected = info.byte_len().ok_or_else(|| {
            Error::MalformedHeader(format!("shape of '{}' overflows a 64-bit size", name))
        })?;
        if end - begin != expected {
            return Err(Error::ShapeMismatch {
                name: name.clone(),
                expected,
                found: end - begin,
            });
        }
        ranges.push((begin, end, name.as_str()));
    }

    ranges.sort_unstable();

    let mut cursor = 0u64;
    let mut previous: Option<&str> = None;
    for &(begin, end, name) in &ranges {
        if begin < cursor {
            return Err(Error::OverlappingTensors {
                first: previous.unwrap_or_default().to_string(),
                second: name.to_string(),
            });
        }
        if begin > cursor {
            return Err(Error::InvalidOffsets {
                name: name.to_string(),
                reason: format!("gap of {} bytes before offset {}", begin - cursor, begin),
            });
        }
        cursor = end;
        previous = Some(name);
    }

    if cursor != payload_len {
        let trailing = payload_len - cursor;
        if config.allow_trailing_bytes {
            log::warn!("ignoring {} trailing payload bytes", trailing);
        } else {
            return Err(Error::InvalidOffsets {
                name: previous.unwrap_or("<payload>").to_string(),
                reason: format!("{} trailing bytes after the last tensor", trailing),
            });
        }
    }

    Ok(())
}

/// A validated, read-only view of a blob.
///
/// All views borrow from the source buffer. The decoded header is owned when
/// parsed from a slice and borrowed when the reader comes from an
/// [`MmapReader`]. Tensor names iterate in header order.
///
/// # Examples
///
/// ```
/// use stensor::{Reader, Writer};
///
/// let mut writer = Writer::new();
/// writer.add("weights", &[2, 2], &[1.0f32, 2.0, 3.0, 4.0])?;
/// let bytes = writer.finish()?;
///
/// let reader = Reader::parse(&bytes)?;
/// let view = reader.tensor("weights")?;
/// assert_eq!(view.shape(), &[2, 2]);
/// assert_eq!(reader.read_as::<f32>("weights")?, vec![1.0, 2.0, 3.0, 4.0]);
/// # Ok::<(), stensor::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reader<'data> {
    layout: Cow<'data, Layout>,
    buffer: &'data [u8],
}

impl<'data> Reader<'data> {
    /// Parses and validates a blob with the default configuration.
    pub fn parse(buffer: &'data [u8]) -> Result<Self> {
        Self::parse_with(buffer, &ReaderConfig::default())
    }

    /// Parses and validates a blob.
    pub fn parse_with(buffer: &'data [u8], config: &ReaderConfig) -> Result<Self> {
        let layout = Layout::parse(buffer, config)?;
        Ok(Self {
            layout: Cow::Owned(layout),
            buffer,
        })
    }

    /// Returns a borrowed view of the named tensor.
    pub fn tensor(&self, name: &str) -> Result<TensorView<'data>> {
        let info = self.layout.info(name)?;
        Ok(self.layout.view(self.buffer, info))
    }

    /// Header entry for the named tensor.
    pub fn info(&self, name: &str) -> Result<&TensorInfo> {
        self.layout.info(name)
    }

    /// Tensor names in header order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layout.header.tensors.iter().map(|(n, _)| n.as_str())
    }

    /// All tensors in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TensorView<'data>)> {
        self.layout
            .header
            .tensors
            .iter()
            .map(|(name, info)| (name.as_str(), self.layout.view(self.buffer, info)))
    }

    pub fn len(&self) -> usize {
        self.layout.header.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.header.tensors.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layout.index.contains_key(name)
    }

    /// The `__metadata__` map, if present.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.layout.header.metadata.as_ref()
    }

    /// The decoded header.
    pub fn header(&self) -> &Header {
        &self.layout.header
    }

    /// Header length `N` as stored in the length prefix.
    pub fn header_len(&self) -> usize {
        self.layout.header_len
    }

    /// The payload region, starting right after the header.
    pub fn payload(&self) -> &'data [u8] {
        &self.buffer[self.layout.data_start..]
    }

    /// Decodes the named tensor into a typed vector.
    pub fn read_as<T: TensorElement>(&self, name: &str) -> Result<Vec<T>> {
        self.tensor(name)?
            .decode_as(&format!("tensor '{}'", name))
    }

    /// Reinterprets the named tensor as `&[T]` without copying.
    pub fn view_as<T: TensorElement + bytemuck::Pod>(&self, name: &str) -> Result<&'data [T]> {
        let info = self.layout.info(name)?;
        let bytes = self.layout.bytes(self.buffer, info);
        cast_bytes(info.dtype, bytes, &format!("tensor '{}'", name))
    }
}

/// Reader over a memory-mapped file.
///
/// The header is validated once at open time; [`MmapReader::reader`] hands
/// out a [`Reader`] whose views borrow from the mapping.
pub struct MmapReader {
    mmap: Mmap,
    layout: Layout,
}

impl MmapReader {
    /// Maps and validates a file with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ReaderConfig::default())
    }

    /// Maps and validates a file.
    pub fn open_with(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // The file must not be modified while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        let layout = Layout::parse(&mmap, config)?;
        log::debug!("mapped {} ({} bytes)", path.display(), mmap.len());
        Ok(Self { mmap, layout })
    }

    /// A reader borrowing both the mapping and the validated header.
    pub fn reader(&self) -> Reader<'_> {
        Reader {
            layout: Cow::Borrowed(&self.layout),
            buffer: &self.mmap,
        }
    }

    /// Returns a borrowed view of the named tensor.
    pub fn tensor(&self, name: &str) -> Result<TensorView<'_>> {
        let info = self.layout.info(name)?;
        Ok(self.layout.view(&self.mmap, info))
    }

    /// Tensor names in header order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layout.header.tensors.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.layout.header.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.header.tensors.is_empty()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.layout.header.metadata.as_ref()
    }

    /// Total size of the mapped file.
    pub fn file_len(&self) -> usize {
        self.mmap.len()
    }
}
