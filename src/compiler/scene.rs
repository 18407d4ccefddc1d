use std::path::PathBuf;

use serde_json::Value;

use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::foundation::json::{check_format, mandatory, optional_f32, optional_floats, read_json};
use crate::material::definition::{apply_property_overrides, load_material};
use crate::project::resolver::{AssetIdentityResolver, SourceAssetId};
use crate::resource::format;
use crate::resource::writer::MemoryFile;

pub(crate) struct SceneCompiler;

/// Scene item kinds, serialized by the hash of their name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SceneItemKind {
    Camera,
    Light,
    Mesh,
    Sky,
    Material,
}

impl SceneItemKind {
    fn parse(key: &str) -> ForgeResult<Self> {
        match key.split('#').next().unwrap_or(key) {
            "Camera" => Ok(Self::Camera),
            "Light" => Ok(Self::Light),
            "Mesh" => Ok(Self::Mesh),
            "Sky" => Ok(Self::Sky),
            "Material" => Ok(Self::Material),
            other => Err(ForgeError::malformed(format!("unknown scene item type '{other}'"))),
        }
    }

    fn type_id(self) -> StringId {
        match self {
            Self::Camera => StringId::new("CameraSceneItem"),
            Self::Light => StringId::new("LightSceneItem"),
            Self::Mesh => StringId::new("MeshSceneItem"),
            Self::Sky => StringId::new("SkySceneItem"),
            Self::Material => StringId::new("MaterialSceneItem"),
        }
    }
}

fn light_type(item: &Value) -> ForgeResult<u32> {
    match item.get("LightType").and_then(Value::as_str).unwrap_or("POINT") {
        "DIRECTIONAL" => Ok(0),
        "POINT" => Ok(1),
        "SPOT" => Ok(2),
        other => Err(ForgeError::malformed(format!("unknown LightType '{other}'"))),
    }
}

fn material_id(resolver: &AssetIdentityResolver, item: &Value, ctx: &str) -> ForgeResult<StringId> {
    resolver.resolve_json(mandatory(item, "MaterialAssetId", ctx)?, ctx)
}

/// Serialize one item payload; material overrides add their source files to `dependencies`.
fn write_item(
    resolver: &AssetIdentityResolver,
    kind: SceneItemKind,
    item: &Value,
    dependencies: &mut Vec<PathBuf>,
) -> ForgeResult<MemoryFile> {
    let mut payload = MemoryFile::new();
    match kind {
        SceneItemKind::Camera => {}
        SceneItemKind::Light => {
            payload.write_u32(light_type(item)?);
            for c in optional_floats::<3>(item, "Color", "Light")?.unwrap_or([1.0; 3]) {
                payload.write_f32(c);
            }
            payload.write_f32(optional_f32(item, "Radius", "Light")?.unwrap_or(1.0));
        }
        SceneItemKind::Mesh => {
            payload.write_id(resolver.resolve_json(mandatory(item, "MeshAssetId", "Mesh")?, "Mesh")?);
            let materials = match item.get("SubMeshMaterialAssetIds") {
                None => Vec::new(),
                Some(Value::Array(ids)) => ids
                    .iter()
                    .map(|v| resolver.resolve_json(v, "SubMeshMaterialAssetIds"))
                    .collect::<ForgeResult<Vec<_>>>()?,
                Some(_) => {
                    return Err(ForgeError::malformed(
                        "Mesh: SubMeshMaterialAssetIds must be an array",
                    ));
                }
            };
            payload.write_u32(materials.len() as u32);
            for id in materials {
                payload.write_id(id);
            }
        }
        SceneItemKind::Sky => payload.write_id(material_id(resolver, item, "Sky")?),
        SceneItemKind::Material => {
            let source_id = SourceAssetId::from_json(mandatory(item, "MaterialAssetId", "Material")?, "Material")?;
            let material = load_material(resolver, source_id)?;
            let overrides = match item.get("Properties") {
                None => Default::default(),
                Some(Value::Object(obj)) => {
                    apply_property_overrides(resolver, obj, &material.properties, &material.logical_path)?
                }
                Some(_) => {
                    return Err(ForgeError::malformed("Material: Properties must be an object"));
                }
            };
            dependencies.extend(material.source_files);
            payload.write_id(material.compiled_id);
            payload.write_u32(overrides.len() as u32);
            for p in &overrides {
                payload.write(p);
            }
        }
    }
    Ok(payload)
}

/// Serialize the scene document; returns the payload and the extra files it depends on.
pub(crate) fn write_scene(
    doc: &Value,
    resolver: &AssetIdentityResolver,
) -> ForgeResult<(MemoryFile, Vec<PathBuf>)> {
    let body = mandatory(doc, format::SCENE.name, "document")?;
    let nodes = match body.get("Nodes") {
        None => &[][..],
        Some(Value::Array(nodes)) => nodes.as_slice(),
        Some(_) => return Err(ForgeError::malformed("scene 'Nodes' must be an array")),
    };

    let mut dependencies = Vec::new();
    let mut file = MemoryFile::new();
    file.write_u32(nodes.len() as u32);
    for (i, node) in nodes.iter().enumerate() {
        let ctx = format!("scene node {i}");
        let position = optional_floats::<3>(node, "Position", &ctx)?.unwrap_or([0.0; 3]);
        let rotation = optional_floats::<4>(node, "Rotation", &ctx)?.unwrap_or([0.0, 0.0, 0.0, 1.0]);
        let scale = optional_floats::<3>(node, "Scale", &ctx)?.unwrap_or([1.0; 3]);
        for c in position.iter().chain(&rotation).chain(&scale) {
            file.write_f32(*c);
        }

        let items = match node.get("Items") {
            None => None,
            Some(Value::Object(items)) => Some(items),
            Some(_) => {
                return Err(ForgeError::malformed(format!("{ctx}: 'Items' must be an object")));
            }
        };
        file.write_u32(items.map_or(0, |items| items.len() as u32));
        for (key, item) in items.into_iter().flatten() {
            let kind = SceneItemKind::parse(key)?;
            let payload = write_item(resolver, kind, item, &mut dependencies)?;
            file.write_id(kind.type_id());
            file.write_u32(payload.len() as u32);
            file.write_bytes(payload.as_bytes());
        }
    }
    Ok((file, dependencies))
}

impl AssetCompiler for SceneCompiler {
    fn type_name(&self) -> &'static str {
        "Scene"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".scene")?;
        if input.input_missing(&target) {
            return output.add_asset(&target);
        }
        let doc = read_json(&target.input_file)?;
        check_format(&doc, format::SCENE.name, format::SCENE.version)?;
        let (file, dependencies) = write_scene(&doc, input.resolver)?;

        let dependencies: Vec<_> = dependencies.iter().map(|p| p.as_path()).collect();
        if input.needs_to_be_compiled(configuration, &target, &dependencies) {
            file.finalize_as(format::SCENE, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compiler/scene.rs"]
mod tests;
