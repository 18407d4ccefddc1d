use std::path::Path;

use xxhash_rust::xxh3::xxh3_64;

const FNV1A32_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV1A32_PRIME: u32 = 0x0100_0193;

/// FNV-1a 32-bit over `bytes`. The algorithm is part of the compiled wire format: every
/// string-derived identifier (asset ids, compiler type ids, pass type ids, property ids)
/// is produced by it.
pub(crate) const fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut h = FNV1A32_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        h ^= bytes[i] as u32;
        h = h.wrapping_mul(FNV1A32_PRIME);
        i += 1;
    }
    h
}

/// Compile-time stable 32-bit identifier derived from a string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringId(pub u32);

impl StringId {
    /// Sentinel for "no identifier".
    pub const UNINITIALIZED: StringId = StringId(u32::MAX);

    /// Hash `s` with FNV-1a 32.
    pub const fn new(s: &str) -> Self {
        Self(fnv1a32(s.as_bytes()))
    }

    /// Raw 32-bit value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<&str> for StringId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a file for the build cache: xxh3-64 of the absolute path.
///
/// Separators are normalized so the same file hashes identically regardless of how the
/// path was spelled on Windows.
pub(crate) fn file_id(path: &Path) -> u64 {
    let s = path.to_string_lossy().replace('\\', "/");
    xxh3_64(s.as_bytes())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/hash.rs"]
mod tests;
