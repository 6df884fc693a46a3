//! Core data types: dtypes, header entries and tensor views.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reader::TensorElement;
use crate::utils::checked_byte_len;

/// Size of the little-endian `u64` header length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Reserved header key holding the free-form string metadata.
pub const METADATA_KEY: &str = "__metadata__";

/// Default ceiling on the header length accepted by the reader (100 MB).
pub const DEFAULT_MAX_HEADER_SIZE: u64 = 100_000_000;

/// Default alignment of the payload region, in bytes.
pub const HEADER_ALIGNMENT: u64 = 8;

/// Free-form string metadata stored under [`METADATA_KEY`].
///
/// Keys are always encoded in sorted order, whatever order they were
/// inserted in.
pub type Metadata = BTreeMap<String, String>;

/// Scalar element types a tensor may hold.
///
/// Serialized as the upper-case tag (`"F32"`, `"BF16"`, `"BOOL"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dtype {
    Bool,
    U8,
    I8,
    U16,
    I16,
    F16,
    BF16,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
}

impl Dtype {
    /// Every supported dtype, smallest first.
    pub const ALL: [Dtype; 13] = [
        Dtype::Bool,
        Dtype::U8,
        Dtype::I8,
        Dtype::U16,
        Dtype::I16,
        Dtype::F16,
        Dtype::BF16,
        Dtype::U32,
        Dtype::I32,
        Dtype::F32,
        Dtype::U64,
        Dtype::I64,
        Dtype::F64,
    ];

    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            Dtype::F64 | Dtype::I64 | Dtype::U64 => 8,
            Dtype::F32 | Dtype::I32 | Dtype::U32 => 4,
            Dtype::F16 | Dtype::BF16 | Dtype::I16 | Dtype::U16 => 2,
            Dtype::I8 | Dtype::U8 | Dtype::Bool => 1,
        }
    }

    pub fn is_multi_byte(&self) -> bool {
        self.size() > 1
    }

    /// The tag used in the JSON header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Bool => "BOOL",
            Dtype::U8 => "U8",
            Dtype::I8 => "I8",
            Dtype::U16 => "U16",
            Dtype::I16 => "I16",
            Dtype::F16 => "F16",
            Dtype::BF16 => "BF16",
            Dtype::U32 => "U32",
            Dtype::I32 => "I32",
            Dtype::F32 => "F32",
            Dtype::U64 => "U64",
            Dtype::I64 => "I64",
            Dtype::F64 => "F64",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tensor entry of the JSON header.
///
/// `data_offsets` are relative to the start of the payload region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TensorInfo {
    pub dtype: Dtype,
    pub shape: Vec<u64>,
    pub data_offsets: (u64, u64),
}

impl TensorInfo {
    /// Expected payload size in bytes; `None` on overflow.
    pub fn byte_len(&self) -> Option<u64> {
        checked_byte_len(&self.shape, self.dtype)
    }

    /// Length of the declared offset span.
    pub fn span(&self) -> u64 {
        self.data_offsets.1.saturating_sub(self.data_offsets.0)
    }
}

/// A tensor's dtype, shape and bytes.
///
/// Views produced by the reader always borrow from the source blob; the
/// writer accepts either borrowed or owned data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorView<'data> {
    dtype: Dtype,
    shape: Vec<u64>,
    data: Cow<'data, [u8]>,
}

impl<'data> TensorView<'data> {
    /// Creates a view, checking that `data` holds exactly
    /// `product(shape) * dtype.size()` little-endian bytes.
    pub fn new(dtype: Dtype, shape: Vec<u64>, data: impl Into<Cow<'data, [u8]>>) -> Result<Self> {
        let data = data.into();
        check_data_len("<view>", dtype, &shape, data.len())?;
        Ok(Self { dtype, shape, data })
    }

    /// Builds a view whose length has already been checked.
    pub(crate) fn from_parts(dtype: Dtype, shape: Vec<u64>, data: Cow<'data, [u8]>) -> Self {
        Self { dtype, shape, data }
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Raw little-endian bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements (1 for a scalar).
    pub fn num_elements(&self) -> usize {
        self.data.len() / self.dtype.size()
    }

    /// True when the bytes borrow from another buffer rather than being owned.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }

    /// Detaches the view from the buffer it borrows.
    pub fn into_owned(self) -> TensorView<'static> {
        TensorView {
            dtype: self.dtype,
            shape: self.shape,
            data: Cow::Owned(self.data.into_owned()),
        }
    }

    /// Decodes the elements into a new vector.
    pub fn to_vec<T: TensorElement>(&self) -> Result<Vec<T>> {
        self.decode_as("tensor view")
    }

    /// Reinterprets the bytes as `&[T]` without copying.
    ///
    /// Fails if the dtype differs, the data is not aligned for `T`, or the
    /// host is big-endian.
    pub fn as_slice<T: TensorElement + bytemuck::Pod>(&self) -> Result<&[T]> {
        self.cast_as("tensor view")
    }

    pub(crate) fn decode_as<T: TensorElement>(&self, context: &str) -> Result<Vec<T>> {
        check_element::<T>(self.dtype, context)?;
        Ok(self
            .data
            .chunks_exact(self.dtype.size())
            .map(T::from_le_bytes)
            .collect())
    }

    pub(crate) fn cast_as<T: TensorElement + bytemuck::Pod>(&self, context: &str) -> Result<&[T]> {
        cast_bytes(self.dtype, &self.data, context)
    }
}

/// Reinterprets little-endian `bytes` of the given dtype as `&[T]`.
pub(crate) fn cast_bytes<'a, T: TensorElement + bytemuck::Pod>(
    dtype: Dtype,
    bytes: &'a [u8],
    context: &str,
) -> Result<&'a [T]> {
    check_element::<T>(dtype, context)?;
    if !crate::utils::is_little_endian() && dtype.is_multi_byte() {
        return Err(Error::TypeMismatch {
            expected: "little-endian host".to_string(),
            found: "big-endian host".to_string(),
            context: context.to_string(),
        });
    }
    bytemuck::try_cast_slice(bytes).map_err(|e| Error::TypeMismatch {
        expected: format!("{}-byte aligned data", std::mem::align_of::<T>()),
        found: format!("{:?}", e),
        context: context.to_string(),
    })
}

fn check_element<T: TensorElement>(dtype: Dtype, context: &str) -> Result<()> {
    if T::DTYPE != dtype {
        return Err(Error::TypeMismatch {
            expected: dtype.as_str().to_string(),
            found: std::any::type_name::<T>().to_string(),
            context: context.to_string(),
        });
    }
    Ok(())
}

/// Fails with [`Error::InvalidName`] for an empty or reserved tensor name.
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name == METADATA_KEY {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Fails with [`Error::ShapeMismatch`] unless `len` matches shape and dtype.
pub(crate) fn check_data_len(name: &str, dtype: Dtype, shape: &[u64], len: usize) -> Result<()> {
    let found = len as u64;
    match checked_byte_len(shape, dtype) {
        Some(expected) if expected == found => Ok(()),
        Some(expected) => Err(Error::ShapeMismatch {
            name: name.to_string(),
            expected,
            found,
        }),
        None => Err(Error::ShapeMismatch {
            name: name.to_string(),
            expected: u64::MAX,
            found,
        }),
    }
}
