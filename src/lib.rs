//! Safe, zero-copy reader and writer for the safetensors container format.
//!
//! A blob is laid out as:
//!
//! ```text
//! [8 bytes: u64 LE header length N] [N bytes: JSON header] [payload bytes]
//! ```
//!
//! The JSON header maps tensor names to `{dtype, shape, data_offsets}`, with
//! offsets relative to the start of the payload. [`Writer`] builds blobs and
//! [`Reader`] validates them and hands out [`TensorView`]s that borrow from
//! the source buffer.

pub mod error;
pub mod header;
pub mod models;
pub mod reader;
pub mod utils;
pub mod writer;

pub use error::{Error, Result};
pub use header::Header;
pub use models::{Dtype, METADATA_KEY, Metadata, TensorInfo, TensorView};
pub use reader::{MmapReader, Reader, ReaderConfig, TensorElement};
pub use writer::{TensorOrder, Writer, WriterConfig, serialize};
