use crate::types::FarkleError;

/// A forward-only cursor over a legacy enhanced-grammar-tables byte
/// stream. Every field is little-endian; strings are length-prefixed
/// UTF-8 rather than the original format's UTF-16, since this importer
/// re-derives a compatible record stream rather than byte-matching a
/// specific historical release (`spec.md` §6).
pub struct EgtReader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> EgtReader<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    EgtReader { bytes, pos: 0 }
  }

  pub fn at_eof(&self) -> bool {
    self.pos >= self.bytes.len()
  }

  fn take(&mut self, n: usize) -> Result<&'a [u8], FarkleError> {
    let slice = self
      .bytes
      .get(self.pos..self.pos + n)
      .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "truncated legacy grammar table".into() })?;
    self.pos += n;
    Ok(slice)
  }

  pub fn u8(&mut self) -> Result<u8, FarkleError> {
    Ok(self.take(1)?[0])
  }

  pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], FarkleError> {
    self.take(n)
  }

  pub fn bool(&mut self) -> Result<bool, FarkleError> {
    Ok(self.u8()? != 0)
  }

  pub fn u16(&mut self) -> Result<u16, FarkleError> {
    Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
  }

  pub fn u32(&mut self) -> Result<u32, FarkleError> {
    Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
  }

  pub fn string(&mut self) -> Result<String, FarkleError> {
    let len = self.u32()? as usize;
    let bytes = self.take(len)?;
    String::from_utf8(bytes.to_vec()).map_err(|e| FarkleError::UnsupportedFormat { detail: e.to_string() })
  }
}
