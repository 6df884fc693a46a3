//! JSON header codec.
//!
//! The header is a JSON object mapping tensor names to [`TensorInfo`]
//! entries, with an optional `"__metadata__"` entry holding a string map:
//!
//! ```text
//! {
//!   "__metadata__": { "format": "pt" },
//!   "some_ints": { "dtype": "I32", "shape": [1, 4], "data_offsets": [0, 16] }
//! }
//! ```
//!
//! Encoding keeps the entry order of the [`Header`]; decoding keeps the order
//! in which entries appear in the text. Neither direction touches payload
//! bytes.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::models::{METADATA_KEY, Metadata, TensorInfo, check_name};

/// Decoded header: ordered tensor entries plus optional metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub metadata: Option<Metadata>,
    pub tensors: Vec<(String, TensorInfo)>,
}

/// A single decoded header entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderEntry {
    Tensor(TensorInfo),
    Metadata(Metadata),
}

/// Serializes a header to compact JSON.
///
/// Names are checked first, so anything this returns is accepted by
/// [`decode`].
pub fn encode(header: &Header) -> Result<Vec<u8>> {
    let mut seen = HashSet::with_capacity(header.tensors.len());
    for (name, _) in &header.tensors {
        check_name(name)?;
        if !seen.insert(name.as_str()) {
            return Err(Error::DuplicateName(name.clone()));
        }
    }
    serde_json::to_vec(header).map_err(Error::HeaderEncode)
}

/// Parses header bytes, failing with [`Error::MalformedHeader`] on any
/// deviation from the entry schema.
pub fn decode(bytes: &[u8]) -> Result<Header> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::MalformedHeader(format!("header is not valid UTF-8: {}", e)))?;
    serde_json::from_str(text).map_err(|e| Error::MalformedHeader(e.to_string()))
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.tensors.len() + usize::from(self.metadata.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(metadata) = &self.metadata {
            map.serialize_entry(METADATA_KEY, metadata)?;
        }
        for (name, info) in &self.tensors {
            map.serialize_entry(name, info)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Header {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(HeaderVisitor)
    }
}

struct HeaderVisitor;

impl HeaderVisitor {
    fn next_entry<'de, A: MapAccess<'de>>(
        key: &str,
        map: &mut A,
    ) -> std::result::Result<HeaderEntry, A::Error> {
        if key == METADATA_KEY {
            map.next_value::<Metadata>()
                .map(HeaderEntry::Metadata)
                .map_err(|e| de::Error::custom(format!("invalid {}: {}", METADATA_KEY, e)))
        } else {
            map.next_value::<TensorInfo>()
                .map(HeaderEntry::Tensor)
                .map_err(|e| de::Error::custom(format!("invalid entry '{}': {}", key, e)))
        }
    }
}

impl<'de> Visitor<'de> for HeaderVisitor {
    type Value = Header;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of tensor entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Header, A::Error> {
        let mut header = Header::default();
        let mut seen = HashSet::new();

        while let Some(key) = map.next_key::<String>()? {
            if key.is_empty() {
                return Err(de::Error::custom("empty tensor name"));
            }
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate entry '{}'", key)));
            }
            match Self::next_entry(&key, &mut map)? {
                HeaderEntry::Metadata(metadata) => header.metadata = Some(metadata),
                HeaderEntry::Tensor(info) => header.tensors.push((key, info)),
            }
        }

        Ok(header)
    }
}
