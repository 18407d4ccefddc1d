use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::json::{check_format, mandatory, mandatory_str, mandatory_u32, read_json};

/// `Format.Type` of every per-asset descriptor.
pub const ASSET_DESCRIPTOR_FORMAT_TYPE: &str = "Asset";
/// `Format.Version` of every per-asset descriptor.
pub const ASSET_DESCRIPTOR_FORMAT_VERSION: u32 = 1;

/// `Asset.AssetMetadata` of a descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Self-declared source asset id; must equal the assets-table key.
    pub asset_id: u32,
    /// Compiler selector (`Material`, `Texture`, ...).
    pub asset_type: String,
    /// Free-form grouping segment of the logical path.
    pub asset_category: String,
    /// Last segment of the logical path.
    pub asset_name: String,
}

impl AssetMetadata {
    /// `<project>/<type>/<category>/<name>`.
    pub fn logical_path(&self, project_name: &str) -> String {
        format!(
            "{project_name}/{}/{}/{}",
            self.asset_type, self.asset_category, self.asset_name
        )
    }
}

/// A parsed per-asset descriptor.
#[derive(Clone, Debug)]
pub struct AssetDescriptor {
    path: PathBuf,
    metadata: AssetMetadata,
    document: Value,
}

impl AssetDescriptor {
    /// Read and validate the descriptor at `path`.
    pub fn load(path: &Path) -> ForgeResult<Self> {
        let document = read_json(path)?;
        Self::from_value(path, document).map_err(|e| e.in_asset(path))
    }

    pub(crate) fn from_value(path: &Path, document: Value) -> ForgeResult<Self> {
        check_format(
            &document,
            ASSET_DESCRIPTOR_FORMAT_TYPE,
            ASSET_DESCRIPTOR_FORMAT_VERSION,
        )?;
        let asset = mandatory(&document, "Asset", "descriptor")?;
        let meta = mandatory(asset, "AssetMetadata", "Asset")?;
        let metadata = AssetMetadata {
            asset_id: mandatory_u32(meta, "AssetId", "AssetMetadata")?,
            asset_type: mandatory_str(meta, "AssetType", "AssetMetadata")?.to_string(),
            asset_category: mandatory_str(meta, "AssetCategory", "AssetMetadata")?.to_string(),
            asset_name: mandatory_str(meta, "AssetName", "AssetMetadata")?.to_string(),
        };
        if metadata.asset_type.is_empty() || metadata.asset_name.is_empty() {
            return Err(ForgeError::malformed(
                "AssetType and AssetName must be non-empty",
            ));
        }
        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            document,
        })
    }

    /// Absolute path of the descriptor file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the descriptor; input files are relative to it.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Parsed `AssetMetadata`.
    pub fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }

    /// Whole descriptor document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Name of the options member: `<AssetType>AssetCompiler`.
    pub fn compiler_section_name(&self) -> String {
        format!("{}AssetCompiler", self.metadata.asset_type)
    }

    /// `Asset.<AssetType>AssetCompiler`, the type-specific options.
    pub fn compiler_options(&self) -> ForgeResult<&Value> {
        let section = self.compiler_section_name();
        mandatory(&self.document["Asset"], &section, "Asset")
    }

    /// Absolute path of `InputFile` from the compiler options.
    pub fn input_file(&self) -> ForgeResult<PathBuf> {
        let section = self.compiler_section_name();
        let rel = mandatory_str(self.compiler_options()?, "InputFile", &section)?;
        Ok(self.directory().join(rel))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/descriptor.rs"]
mod tests;
