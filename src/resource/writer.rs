use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::resource::format::ResourceFormat;

/// Size in bytes of the fixed header that prefixes every compiled resource file.
pub const FILE_FORMAT_HEADER_SIZE: usize = 16;

/// Fixed header of a compiled resource file, stored little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileFormatHeader {
    /// FNV-1a 32 hash of the format name.
    pub format_type: u32,
    /// Format version.
    pub format_version: u32,
    /// Number of compressed payload bytes following the header.
    pub compressed_size: u32,
    /// Number of payload bytes after decompression.
    pub decompressed_size: u32,
}

impl FileFormatHeader {
    pub(crate) fn to_bytes(self) -> [u8; FILE_FORMAT_HEADER_SIZE] {
        let mut out = [0u8; FILE_FORMAT_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.format_type.to_le_bytes());
        out[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        out[8..12].copy_from_slice(&self.compressed_size.to_le_bytes());
        out[12..16].copy_from_slice(&self.decompressed_size.to_le_bytes());
        out
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> ForgeResult<Self> {
        if bytes.len() < FILE_FORMAT_HEADER_SIZE {
            return Err(ForgeError::format(format!(
                "file is {} bytes, shorter than the {FILE_FORMAT_HEADER_SIZE} byte header",
                bytes.len()
            )));
        }
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Ok(Self {
            format_type: word(0),
            format_version: word(4),
            compressed_size: word(8),
            decompressed_size: word(12),
        })
    }
}

/// Types that know their own little-endian binary layout.
pub trait BinaryWrite {
    /// Append the binary representation of `self` to `out`.
    fn write_to(&self, out: &mut MemoryFile);
}

/// Append-only in-memory byte buffer a compiler serializes one asset into.
///
/// The buffer is consumed by [`MemoryFile::finalize`], which compresses it and writes the
/// header-prefixed result to disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryFile {
    data: Vec<u8>,
}

impl MemoryFile {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing uncompressed payload bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Number of uncompressed bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the uncompressed payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Append a value with a known binary layout.
    pub fn write<T: BinaryWrite + ?Sized>(&mut self, value: &T) {
        value.write_to(self);
    }

    /// Append a `u8`.
    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    /// Append a `bool` as one byte.
    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    /// Append a little-endian `u16`.
    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Append a little-endian `u32`.
    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Append a little-endian `i32`.
    pub fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Append a little-endian `f32`.
    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    /// Append a [`StringId`].
    pub fn write_id(&mut self, id: StringId) {
        self.write_u32(id.as_u32());
    }

    /// Append `s` as a zero-padded field of exactly `capacity` bytes.
    ///
    /// At least one terminating zero byte is always kept, so `s` may use at most
    /// `capacity - 1` bytes.
    pub fn write_bounded_str(&mut self, s: &str, capacity: usize) -> ForgeResult<()> {
        if s.len() >= capacity {
            return Err(ForgeError::malformed(format!(
                "'{s}' is {} bytes, the maximum is {}",
                s.len(),
                capacity - 1
            )));
        }
        self.write_bytes(s.as_bytes());
        self.data.resize(self.data.len() + capacity - s.len(), 0);
        Ok(())
    }

    /// Compress the payload and return the complete header-prefixed file image.
    pub fn encode(self, format_type: StringId, format_version: u32) -> ForgeResult<Vec<u8>> {
        let decompressed_size = u32::try_from(self.data.len()).map_err(|_| {
            ForgeError::format(format!(
                "payload of {} bytes exceeds the 4 GiB resource limit",
                self.data.len()
            ))
        })?;
        let compressed = if self.data.is_empty() {
            Vec::new()
        } else {
            lz4_flex::block::compress(&self.data)
        };
        let header = FileFormatHeader {
            format_type: format_type.as_u32(),
            format_version,
            compressed_size: compressed.len() as u32,
            decompressed_size,
        };
        let mut out = Vec::with_capacity(FILE_FORMAT_HEADER_SIZE + compressed.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    /// Compress the payload and write it, prefixed by the file format header, to
    /// `destination`. Parent directories are created as needed.
    pub fn finalize(
        self,
        format_type: StringId,
        format_version: u32,
        destination: &Path,
    ) -> ForgeResult<()> {
        let bytes = self.encode(format_type, format_version)?;
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(destination, bytes)
            .with_context(|| format!("write resource '{}'", destination.display()))?;
        Ok(())
    }

    /// [`MemoryFile::finalize`] using a registered [`ResourceFormat`].
    pub fn finalize_as(self, format: ResourceFormat, destination: &Path) -> ForgeResult<()> {
        self.finalize(format.type_id(), format.version, destination)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resource/writer.rs"]
mod tests;
