use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::json::{read_json, read_json_as};

/// Top-level project manifest: `{"Project": {...}}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectManifest {
    /// Project section.
    pub project: ProjectSection,
}

/// `Project` section of the project manifest.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectSection {
    /// Project metadata.
    pub project_metadata: ProjectMetadata,
    /// Assets table, relative to the manifest.
    pub assets_filename: String,
    /// Targets table, relative to the manifest.
    pub targets_filename: String,
}

/// `ProjectMetadata` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectMetadata {
    /// Project name, the first segment of every compiled asset id.
    pub name: String,
}

impl ProjectManifest {
    /// Read the project manifest file.
    pub fn load(path: &Path) -> ForgeResult<Self> {
        let manifest: Self = read_json_as(path)?;
        if manifest.project.project_metadata.name.is_empty() {
            return Err(ForgeError::malformed(format!(
                "'{}': project name must be non-empty",
                path.display()
            )));
        }
        Ok(manifest)
    }
}

/// Read the assets table: source asset id (decimal string) to descriptor filename.
///
/// The table is either the whole document or its `Assets` member.
pub fn load_assets_table(path: &Path) -> ForgeResult<BTreeMap<u32, String>> {
    let doc = read_json(path)?;
    let table = match doc.get("Assets") {
        Some(assets) => assets,
        None => &doc,
    };
    let obj = table.as_object().ok_or_else(|| {
        ForgeError::malformed(format!("'{}': assets table must be an object", path.display()))
    })?;

    let mut out = BTreeMap::new();
    for (key, value) in obj {
        if key == "Format" {
            continue;
        }
        let id: u32 = key.parse().map_err(|_| {
            ForgeError::malformed(format!(
                "'{}': asset id '{key}' is not a decimal u32",
                path.display()
            ))
        })?;
        let filename = value.as_str().ok_or_else(|| {
            ForgeError::malformed(format!(
                "'{}': filename of asset {id} must be a string",
                path.display()
            ))
        })?;
        out.insert(id, filename.to_string());
    }
    Ok(out)
}

/// One entry of `RendererTargets`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RendererTarget {
    /// Platform name (`Windows`, `Linux`, ...).
    pub platform: String,
    /// Key into `TextureTargets`.
    pub texture_target: String,
}

/// One entry of `TextureTargets`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextureTarget {
    /// Compiled texture container format (`dds`, `ktx`, `crn`, ...).
    pub file_format: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TargetsModel {
    renderer_targets: BTreeMap<String, RendererTarget>,
    #[serde(default)]
    texture_targets: BTreeMap<String, TextureTarget>,
}

/// Parsed per-project targets table, both typed and as the raw document.
#[derive(Clone, Debug)]
pub struct Targets {
    model: TargetsModel,
    document: Value,
    path: Option<PathBuf>,
}

impl Targets {
    /// Read the targets table.
    pub fn load(path: &Path) -> ForgeResult<Self> {
        let document = read_json(path)?;
        let mut targets = Self::from_value(document)
            .map_err(|e| ForgeError::malformed(format!("'{}': {e}", path.display())))?;
        targets.path = Some(path.to_path_buf());
        Ok(targets)
    }

    /// Build from an already parsed document.
    pub fn from_value(document: Value) -> ForgeResult<Self> {
        let model: TargetsModel = serde_json::from_value(document.clone())
            .map_err(|e| ForgeError::malformed(format!("invalid targets table: {e}")))?;
        Ok(Self {
            model,
            document,
            path: None,
        })
    }

    /// Raw targets document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// File the table was loaded from; compilers whose output depends on it track it.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lookup a renderer target by name.
    pub fn renderer_target(&self, name: &str) -> ForgeResult<&RendererTarget> {
        self.model.renderer_targets.get(name).ok_or_else(|| {
            ForgeError::unresolved(format!("renderer target '{name}' is unknown"))
        })
    }

    /// Texture target selected by a renderer target.
    pub fn texture_target_for(&self, renderer_target: &str) -> ForgeResult<&TextureTarget> {
        let rt = self.renderer_target(renderer_target)?;
        self.model
            .texture_targets
            .get(&rt.texture_target)
            .ok_or_else(|| {
                ForgeError::unresolved(format!(
                    "texture target '{}' of renderer target '{renderer_target}' is unknown",
                    rt.texture_target
                ))
            })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/manifest.rs"]
mod tests;
