use std::collections::BTreeMap;
use std::path::Path;

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::resource::format::ASSET_PACKAGE;
use crate::resource::reader::{BinaryReader, load_format};
use crate::resource::writer::MemoryFile;

/// Size of the zero-padded filename field of one package record.
pub const MAXIMUM_ASSET_FILENAME_LENGTH: usize = 128;

/// One compiled asset as the runtime sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    /// Compiled asset id (hash of `<project>/<type>/<category>/<name>`).
    pub asset_id: StringId,
    /// Output-relative filename of the compiled resource.
    pub filename: String,
}

/// Ordered, unique-by-id index of every compiled asset of a project.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetPackage {
    assets: BTreeMap<StringId, Asset>,
}

impl AssetPackage {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset, replacing any previous entry with the same id.
    pub fn add_asset(&mut self, asset_id: StringId, filename: impl Into<String>) -> ForgeResult<()> {
        let filename = filename.into();
        if filename.len() >= MAXIMUM_ASSET_FILENAME_LENGTH {
            return Err(ForgeError::malformed(format!(
                "asset filename '{filename}' exceeds {} bytes",
                MAXIMUM_ASSET_FILENAME_LENGTH - 1
            )));
        }
        self.assets.insert(asset_id, Asset { asset_id, filename });
        Ok(())
    }

    /// Lookup an asset by compiled id.
    pub fn get(&self, asset_id: StringId) -> Option<&Asset> {
        self.assets.get(&asset_id)
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Return `true` when the package holds no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterate assets sorted by id.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    /// Serialize as `{numberOfAssets}` followed by sorted `{assetId, filename[128]}` records.
    pub fn to_memory_file(&self) -> ForgeResult<MemoryFile> {
        let mut out = MemoryFile::new();
        out.write_u32(self.assets.len() as u32);
        for asset in self.assets.values() {
            out.write_id(asset.asset_id);
            out.write_bounded_str(&asset.filename, MAXIMUM_ASSET_FILENAME_LENGTH)?;
        }
        Ok(out)
    }

    /// Write the package resource file.
    pub fn write_to_file(&self, path: &Path) -> ForgeResult<()> {
        self.to_memory_file()?.finalize_as(ASSET_PACKAGE, path)
    }

    /// Parse a package payload.
    pub fn from_payload(payload: &[u8]) -> ForgeResult<Self> {
        let mut r = BinaryReader::new(payload);
        let count = r.read_u32()?;
        let mut out = Self::new();
        for _ in 0..count {
            let asset_id = StringId(r.read_u32()?);
            let filename = r.read_bounded_str(MAXIMUM_ASSET_FILENAME_LENGTH)?;
            out.assets.insert(asset_id, Asset { asset_id, filename });
        }
        if r.remaining() != 0 {
            return Err(ForgeError::format(format!(
                "{} trailing bytes after asset package records",
                r.remaining()
            )));
        }
        Ok(out)
    }

    /// Read a package resource file, rejecting unknown format types and versions.
    pub fn read_from_file(path: &Path) -> ForgeResult<Self> {
        Self::from_payload(&load_format(path, ASSET_PACKAGE)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resource/package.rs"]
mod tests;
