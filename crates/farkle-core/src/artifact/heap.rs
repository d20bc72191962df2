use std::collections::HashMap;

/// A string handle is the byte offset of the string within the string
/// heap (`spec.md` §4.6). Offset `0` is reserved for the empty string.
pub type StringHandle = u32;

/// A blob handle is the byte offset of a length-prefixed blob within the
/// blob heap.
pub type BlobHandle = u32;

/// Sentinel used by optional `StringHandle`/`BlobHandle` fields that have
/// no value. Distinct from `0`, which is the valid handle of the empty
/// string / an empty blob.
pub const NONE_HANDLE: u32 = u32::MAX;

/// Concatenated, deduplicated, NUL-terminated UTF-8 strings
/// (`spec.md` §4.6).
#[derive(Debug, Default)]
pub struct StringHeapBuilder {
  bytes: Vec<u8>,
  index: HashMap<String, StringHandle>,
}

impl StringHeapBuilder {
  pub fn new() -> Self {
    let mut heap = StringHeapBuilder::default();
    // Offset 0 is always the empty string.
    heap.bytes.push(0);
    heap.index.insert(String::new(), 0);
    heap
  }

  pub fn intern(&mut self, s: &str) -> StringHandle {
    if let Some(&handle) = self.index.get(s) {
      return handle;
    }
    let handle = self.bytes.len() as StringHandle;
    self.bytes.extend_from_slice(s.as_bytes());
    self.bytes.push(0);
    self.index.insert(s.to_string(), handle);
    handle
  }

  pub fn intern_opt(&mut self, s: Option<&str>) -> u32 {
    match s {
      Some(s) => self.intern(s),
      None => NONE_HANDLE,
    }
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.bytes
  }
}

pub fn string_at(bytes: &[u8], handle: StringHandle) -> Result<String, crate::types::FarkleError> {
  let start = handle as usize;
  if start > bytes.len() {
    return Err(crate::types::FarkleError::UnsupportedFormat {
      detail: format!("string heap offset {start} out of bounds"),
    });
  }
  let end = bytes[start..]
    .iter()
    .position(|&b| b == 0)
    .map(|i| start + i)
    .ok_or_else(|| crate::types::FarkleError::UnsupportedFormat {
      detail: "unterminated string in string heap".into(),
    })?;
  String::from_utf8(bytes[start..end].to_vec())
    .map_err(|e| crate::types::FarkleError::UnsupportedFormat { detail: e.to_string() })
}

pub fn string_at_opt(bytes: &[u8], handle: u32) -> Result<Option<String>, crate::types::FarkleError> {
  if handle == NONE_HANDLE {
    Ok(None)
  } else {
    string_at(bytes, handle).map(Some)
  }
}

/// Length-prefixed (`u32` little-endian length) byte blobs
/// (`spec.md` §4.6).
#[derive(Debug, Default)]
pub struct BlobHeapBuilder {
  bytes: Vec<u8>,
}

impl BlobHeapBuilder {
  pub fn new() -> Self {
    BlobHeapBuilder::default()
  }

  pub fn push(&mut self, blob: &[u8]) -> BlobHandle {
    let handle = self.bytes.len() as BlobHandle;
    self.bytes.extend_from_slice(&(blob.len() as u32).to_le_bytes());
    self.bytes.extend_from_slice(blob);
    handle
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.bytes
  }
}

pub fn blob_at(bytes: &[u8], handle: BlobHandle) -> Result<&[u8], crate::types::FarkleError> {
  let start = handle as usize;
  let len_bytes = bytes.get(start..start + 4).ok_or_else(|| crate::types::FarkleError::UnsupportedFormat {
    detail: format!("blob heap offset {start} out of bounds"),
  })?;
  let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
  bytes
    .get(start + 4..start + 4 + len)
    .ok_or_else(|| crate::types::FarkleError::UnsupportedFormat { detail: "truncated blob".into() })
}
