use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::foundation::json::as_u32;
use crate::project::descriptor::AssetMetadata;

/// Manifest-local numeric id an asset is referenced by before compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceAssetId(pub u32);

impl std::fmt::Display for SourceAssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SourceAssetId {
    /// Parse a source id written as a JSON number or decimal string.
    pub fn from_json(value: &Value, ctx: &str) -> ForgeResult<Self> {
        as_u32(value).map(Self).ok_or_else(|| {
            ForgeError::malformed(format!("{ctx}: '{value}' is not a source asset id"))
        })
    }
}

/// Stable runtime id of `<project>/<type>/<category>/<name>`.
pub fn compiled_asset_id(logical_path: &str) -> StringId {
    StringId::new(logical_path)
}

/// Everything the resolver knows about one declared asset.
#[derive(Clone, Debug)]
pub struct ResolvedAsset {
    /// Assets-table key.
    pub source_id: SourceAssetId,
    /// Hash of [`ResolvedAsset::logical_path`].
    pub compiled_id: StringId,
    /// `<project>/<type>/<category>/<name>`.
    pub logical_path: String,
    /// Absolute path of the descriptor.
    pub descriptor_path: PathBuf,
    /// Metadata read from the descriptor.
    pub metadata: AssetMetadata,
}

/// Read-only mapping from source asset ids to compiled ids and descriptor files.
///
/// Built once per project load, then shared by every compiler invocation.
#[derive(Clone, Debug, Default)]
pub struct AssetIdentityResolver {
    project_name: String,
    source_to_compiled: HashMap<SourceAssetId, StringId>,
    source_to_filename: HashMap<SourceAssetId, PathBuf>,
    assets: BTreeMap<SourceAssetId, ResolvedAsset>,
    compiled_owner: HashMap<StringId, SourceAssetId>,
}

impl AssetIdentityResolver {
    /// Empty resolver for `project_name`.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Self::default()
        }
    }

    /// Register one asset. Two assets sharing a logical path are rejected.
    pub fn insert(
        &mut self,
        source_id: SourceAssetId,
        descriptor_path: impl Into<PathBuf>,
        metadata: AssetMetadata,
    ) -> ForgeResult<StringId> {
        let logical_path = metadata.logical_path(&self.project_name);
        let compiled_id = compiled_asset_id(&logical_path);
        if let Some(owner) = self.compiled_owner.get(&compiled_id)
            && *owner != source_id
        {
            return Err(ForgeError::malformed(format!(
                "asset {source_id} has the same logical path '{logical_path}' as asset {owner}"
            )));
        }
        let descriptor_path = descriptor_path.into();
        self.source_to_compiled.insert(source_id, compiled_id);
        self.source_to_filename
            .insert(source_id, descriptor_path.clone());
        self.compiled_owner.insert(compiled_id, source_id);
        self.assets.insert(
            source_id,
            ResolvedAsset {
                source_id,
                compiled_id,
                logical_path,
                descriptor_path,
                metadata,
            },
        );
        Ok(compiled_id)
    }

    /// Project name every logical path starts with.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Compiled id another compiler emits for `source_id`.
    pub fn compiled_asset_id(&self, source_id: SourceAssetId) -> ForgeResult<StringId> {
        self.source_to_compiled
            .get(&source_id)
            .copied()
            .ok_or_else(|| unknown(source_id))
    }

    /// Absolute descriptor filename of `source_id`.
    pub fn absolute_filename(&self, source_id: SourceAssetId) -> ForgeResult<&Path> {
        self.source_to_filename
            .get(&source_id)
            .map(PathBuf::as_path)
            .ok_or_else(|| unknown(source_id))
    }

    /// Full record of `source_id`.
    pub fn asset(&self, source_id: SourceAssetId) -> ForgeResult<&ResolvedAsset> {
        self.assets.get(&source_id).ok_or_else(|| unknown(source_id))
    }

    /// Parse a JSON source id and map it to its compiled id.
    pub fn resolve_json(&self, value: &Value, ctx: &str) -> ForgeResult<StringId> {
        let source_id = SourceAssetId::from_json(value, ctx)?;
        self.compiled_asset_id(source_id)
            .map_err(|_| ForgeError::unresolved(format!("{ctx}: source asset ID {source_id} is unknown")))
    }

    /// Registered assets, ordered by source id.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedAsset> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn unknown(source_id: SourceAssetId) -> ForgeError {
    ForgeError::unresolved(format!("source asset ID {source_id} is unknown"))
}

#[cfg(test)]
#[path = "../../tests/unit/project/resolver.rs"]
mod tests;
