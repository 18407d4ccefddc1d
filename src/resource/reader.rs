use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::resource::format::ResourceFormat;
use crate::resource::writer::{FILE_FORMAT_HEADER_SIZE, FileFormatHeader};

/// Upper bound of the LZ4 block expansion ratio; a header claiming more is corrupt.
const MAXIMUM_EXPANSION_RATIO: u64 = 255;

/// A decoded compiled resource: header plus decompressed payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedResource {
    /// File format header as stored on disk.
    pub header: FileFormatHeader,
    /// Decompressed payload bytes.
    pub payload: Vec<u8>,
}

/// Decode a header-prefixed resource image.
pub fn decode_resource(bytes: &[u8]) -> ForgeResult<LoadedResource> {
    let header = FileFormatHeader::from_bytes(bytes)?;
    let body = &bytes[FILE_FORMAT_HEADER_SIZE..];
    if body.len() != header.compressed_size as usize {
        return Err(ForgeError::format(format!(
            "header declares {} compressed bytes, file holds {}",
            header.compressed_size,
            body.len()
        )));
    }
    if header.decompressed_size == 0 && !body.is_empty() {
        return Err(ForgeError::format(format!(
            "header declares an empty payload but {} compressed bytes follow",
            body.len()
        )));
    }
    let expansion_limit = u64::from(header.compressed_size) * MAXIMUM_EXPANSION_RATIO;
    if u64::from(header.decompressed_size) > expansion_limit {
        return Err(ForgeError::format(format!(
            "header declares {} decompressed bytes for {} compressed bytes",
            header.decompressed_size, header.compressed_size
        )));
    }
    let payload = if header.decompressed_size == 0 {
        Vec::new()
    } else {
        lz4_flex::block::decompress(body, header.decompressed_size as usize)
            .map_err(|e| ForgeError::format(format!("corrupt compressed payload: {e}")))?
    };
    if payload.len() != header.decompressed_size as usize {
        return Err(ForgeError::format(format!(
            "decompressed {} bytes, header declares {}",
            payload.len(),
            header.decompressed_size
        )));
    }
    Ok(LoadedResource { header, payload })
}

/// Read and decode a compiled resource file without checking its type.
pub fn load_resource(path: &Path) -> ForgeResult<LoadedResource> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read resource '{}'", path.display()))?;
    decode_resource(&bytes)
}

/// Read a compiled resource, refusing any type tag or version other than the expected one.
pub fn load_expected(
    path: &Path,
    format_type: StringId,
    format_version: u32,
) -> ForgeResult<Vec<u8>> {
    let loaded = load_resource(path)?;
    if loaded.header.format_type != format_type.as_u32() {
        return Err(ForgeError::format(format!(
            "'{}' has format type {:#010x}, expected {:#010x}",
            path.display(),
            loaded.header.format_type,
            format_type.as_u32()
        )));
    }
    if loaded.header.format_version != format_version {
        return Err(ForgeError::format(format!(
            "'{}' has format version {}, expected {format_version}",
            path.display(),
            loaded.header.format_version
        )));
    }
    Ok(loaded.payload)
}

/// [`load_expected`] using a registered [`ResourceFormat`].
pub fn load_format(path: &Path, format: ResourceFormat) -> ForgeResult<Vec<u8>> {
    load_expected(path, format.type_id(), format.version)
}

/// Little-endian cursor over a decompressed payload.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consume `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> ForgeResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(ForgeError::format(format!(
                "unexpected end of data at offset {}: need {n} bytes, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> ForgeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Consume a `u8`.
    pub fn read_u8(&mut self) -> ForgeResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Consume a one-byte `bool`.
    pub fn read_bool(&mut self) -> ForgeResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Consume a little-endian `u16`.
    pub fn read_u16(&mut self) -> ForgeResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Consume a little-endian `u32`.
    pub fn read_u32(&mut self) -> ForgeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Consume a little-endian `i32`.
    pub fn read_i32(&mut self) -> ForgeResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Consume a little-endian `f32`.
    pub fn read_f32(&mut self) -> ForgeResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Consume a zero-padded string field of `capacity` bytes.
    pub fn read_bounded_str(&mut self, capacity: usize) -> ForgeResult<String> {
        let raw = self.read_bytes(capacity)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8(raw[..end].to_vec())
            .map_err(|e| ForgeError::format(format!("invalid utf-8 in string field: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resource/reader.rs"]
mod tests;
