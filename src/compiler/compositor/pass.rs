use std::path::PathBuf;

use serde_json::Value;

use crate::compiler::compositor::NodeScope;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::foundation::json::{
    mandatory_str, optional_bool, optional_f32, optional_floats, optional_object, optional_str,
    optional_u32,
};
use crate::material::definition::{apply_property_overrides, load_blueprint, load_material};
use crate::material::property::SortedPropertyVector;
use crate::material::reader::TextureAssetResolver;
use crate::project::resolver::{AssetIdentityResolver, SourceAssetId};
use crate::resource::writer::MemoryFile;

/// Bytes of the header every pass starts with.
pub const PASS_HEADER_SIZE: usize = 24;

/// Default material technique of scene, shadow map and quad passes.
pub const DEFAULT_MATERIAL_TECHNIQUE: StringId = StringId::new("Default");

pub(crate) const CLEAR_COLOR: u32 = 1 << 0;
pub(crate) const CLEAR_DEPTH: u32 = 1 << 1;
pub(crate) const CLEAR_STENCIL: u32 = 1 << 2;

/// Closed set of pass types; on the wire each is the FNV-1a 32 hash of its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassType {
    Clear,
    Scene,
    ShadowMap,
    ResolveMultisample,
    Copy,
    Quad,
    DebugGui,
    VrHiddenAreaMesh,
}

impl PassType {
    pub const ALL: [PassType; 8] = [
        Self::Clear,
        Self::Scene,
        Self::ShadowMap,
        Self::ResolveMultisample,
        Self::Copy,
        Self::Quad,
        Self::DebugGui,
        Self::VrHiddenAreaMesh,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Scene => "Scene",
            Self::ShadowMap => "ShadowMap",
            Self::ResolveMultisample => "ResolveMultisample",
            Self::Copy => "Copy",
            Self::Quad => "Quad",
            Self::DebugGui => "DebugGui",
            Self::VrHiddenAreaMesh => "VrHiddenAreaMesh",
        }
    }

    /// `<PassType>` or `<PassType>#<suffix>`.
    pub fn from_key(key: &str) -> ForgeResult<Self> {
        let name = key.split_once('#').map_or(key, |(name, _)| name);
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ForgeError::malformed(format!("unknown compositor pass type '{name}'")))
    }

    pub fn type_id(self) -> StringId {
        StringId::new(self.name())
    }
}

/// `"COLOR | DEPTH"` style flag lists.
pub(crate) fn clear_flags(text: &str, ctx: &str) -> ForgeResult<u32> {
    text.split('|')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .try_fold(0, |flags, flag| match flag {
            "COLOR" => Ok(flags | CLEAR_COLOR),
            "DEPTH" => Ok(flags | CLEAR_DEPTH),
            "STENCIL" => Ok(flags | CLEAR_STENCIL),
            other => Err(ForgeError::malformed(format!("{ctx}: unknown clear flag '{other}'"))),
        })
}

fn optional_u8(pass: &Value, key: &str, default: u8, ctx: &str) -> ForgeResult<u8> {
    match optional_u32(pass, key, ctx)? {
        None => Ok(default),
        Some(v) => u8::try_from(v)
            .map_err(|_| ForgeError::malformed(format!("{ctx}.{key}: {v} does not fit in a byte"))),
    }
}

fn material_technique(pass: &Value) -> StringId {
    optional_str(pass, "MaterialTechnique").map_or(DEFAULT_MATERIAL_TECHNIQUE, StringId::new)
}

fn write_scene_fields(payload: &mut MemoryFile, pass: &Value, ctx: &str) -> ForgeResult<()> {
    let minimum = optional_u8(pass, "MinimumRenderQueueIndex", 0, ctx)?;
    let maximum = optional_u8(pass, "MaximumRenderQueueIndex", u8::MAX, ctx)?;
    if minimum > maximum {
        return Err(ForgeError::malformed(format!(
            "{ctx}: MinimumRenderQueueIndex {minimum} is above MaximumRenderQueueIndex {maximum}"
        )));
    }
    payload.write_u8(minimum);
    payload.write_u8(maximum);
    payload.write_bool(optional_bool(pass, "TransparentPass", ctx)?.unwrap_or(false));
    payload.write_u8(0);
    payload.write_id(material_technique(pass));
    Ok(())
}

/// Material half of quad and debug GUI passes:
/// `{materialAssetId, materialTechnique, materialBlueprintAssetId, numberOfProperties}`
/// followed by the overridden properties.
fn write_material_fields(
    payload: &mut MemoryFile,
    pass: &Value,
    scope: &NodeScope,
    resolver: &AssetIdentityResolver,
    dependencies: &mut Vec<PathBuf>,
    ctx: &str,
) -> ForgeResult<()> {
    let material = pass.get("MaterialAssetId");
    let blueprint = pass.get("MaterialBlueprint");
    let (material_id, blueprint_id, properties, owner) = match (material, blueprint) {
        (Some(_), Some(_)) => {
            return Err(ForgeError::malformed(format!(
                "{ctx}: set either MaterialAssetId or MaterialBlueprint, not both"
            )));
        }
        (Some(id), None) => {
            let material = load_material(resolver, SourceAssetId::from_json(id, ctx)?)?;
            dependencies.extend(material.source_files);
            (
                material.compiled_id,
                material.blueprint_compiled_id,
                material.properties,
                material.logical_path,
            )
        }
        (None, Some(id)) => {
            let blueprint = load_blueprint(resolver, SourceAssetId::from_json(id, ctx)?)?;
            dependencies.extend(blueprint.source_files);
            (
                StringId::UNINITIALIZED,
                blueprint.compiled_id,
                blueprint.properties,
                blueprint.logical_path,
            )
        }
        (None, None) => (
            StringId::UNINITIALIZED,
            StringId::UNINITIALIZED,
            SortedPropertyVector::new(),
            String::new(),
        ),
    };

    let overrides = match optional_object(pass, "SetMaterialProperties", ctx)? {
        None => SortedPropertyVector::new(),
        Some(obj) if obj.is_empty() => SortedPropertyVector::new(),
        Some(_) if blueprint_id == StringId::UNINITIALIZED => {
            return Err(ForgeError::malformed(format!(
                "{ctx}: SetMaterialProperties needs MaterialAssetId or MaterialBlueprint"
            )));
        }
        Some(obj) => apply_property_overrides(
            &PassTextures { scope, resolver },
            obj,
            &properties,
            &owner,
        )?,
    };

    payload.write_id(material_id);
    payload.write_id(material_technique(pass));
    payload.write_id(blueprint_id);
    payload.write_u32(overrides.len() as u32);
    for p in &overrides {
        payload.write(p);
    }
    Ok(())
}

/// Texture literals in pass material properties name render target textures first.
struct PassTextures<'a> {
    scope: &'a NodeScope,
    resolver: &'a AssetIdentityResolver,
}

impl TextureAssetResolver for PassTextures<'_> {
    fn resolve_texture(&self, literal: &str, ctx: &str) -> ForgeResult<StringId> {
        match self.scope.texture(literal) {
            Some(id) => Ok(id),
            None => self.resolver.resolve_texture(literal, ctx),
        }
    }
}

/// Serialize one pass: common header then the type specific payload.
pub(crate) fn write_pass(
    file: &mut MemoryFile,
    key: &str,
    pass: &Value,
    scope: &mut NodeScope,
    resolver: &AssetIdentityResolver,
    dependencies: &mut Vec<PathBuf>,
) -> ForgeResult<()> {
    let pass_type = PassType::from_key(key)?;
    let ctx = format!("pass '{key}'");
    if !pass.is_object() {
        return Err(ForgeError::malformed(format!("{ctx}: must be an object")));
    }

    let mut payload = MemoryFile::new();
    match pass_type {
        PassType::Clear => {
            let flags = clear_flags(optional_str(pass, "Flags").unwrap_or("COLOR | DEPTH"), &ctx)?;
            payload.write_u32(flags);
            for c in optional_floats::<4>(pass, "Color", &ctx)?.unwrap_or([0.0; 4]) {
                payload.write_f32(c);
            }
            payload.write_f32(optional_f32(pass, "Z", &ctx)?.unwrap_or(0.0));
            payload.write_u32(optional_u32(pass, "Stencil", &ctx)?.unwrap_or(0));
        }
        PassType::Scene => write_scene_fields(&mut payload, pass, &ctx)?,
        PassType::ShadowMap => {
            write_scene_fields(&mut payload, pass, &ctx)?;
            let texture = mandatory_str(pass, "Texture", &ctx)?;
            payload.write_id(scope.declare_texture(texture, &ctx)?);
            let cascades = optional_u8(pass, "NumberOfShadowCascades", 4, &ctx)?;
            if !(1..=4).contains(&cascades) {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: NumberOfShadowCascades must be within 1..=4, got {cascades}"
                )));
            }
            let multisamples = optional_u8(pass, "NumberOfShadowMultisamples", 4, &ctx)?;
            if ![1, 2, 4, 8].contains(&multisamples) {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: NumberOfShadowMultisamples must be 1, 2, 4 or 8, got {multisamples}"
                )));
            }
            payload.write_u8(cascades);
            payload.write_u8(multisamples);
            payload.write_u16(0);
        }
        PassType::ResolveMultisample => {
            let source = mandatory_str(pass, "SourceMultisampleFramebuffer", &ctx)?;
            payload.write_id(scope.framebuffer(source, &ctx)?);
        }
        PassType::Copy => {
            let source = mandatory_str(pass, "SourceTexture", &ctx)?;
            let destination = mandatory_str(pass, "DestinationTexture", &ctx)?;
            payload.write_id(scope.texture_reference(destination, &ctx)?);
            payload.write_id(scope.texture_reference(source, &ctx)?);
        }
        PassType::Quad | PassType::DebugGui => {
            write_material_fields(&mut payload, pass, scope, resolver, dependencies, &ctx)?;
        }
        PassType::VrHiddenAreaMesh => {
            let flags = clear_flags(optional_str(pass, "Flags").unwrap_or("DEPTH"), &ctx)?;
            if flags & CLEAR_COLOR != 0 {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: the hidden area mesh can only write DEPTH and STENCIL"
                )));
            }
            payload.write_u32(flags);
            payload.write_u32(optional_u32(pass, "StencilReference", &ctx)?.unwrap_or(0));
        }
    }

    let minimum_depth = optional_f32(pass, "MinimumDepth", &ctx)?.unwrap_or(0.0);
    let maximum_depth = optional_f32(pass, "MaximumDepth", &ctx)?.unwrap_or(1.0);
    if minimum_depth > maximum_depth {
        return Err(ForgeError::malformed(format!(
            "{ctx}: MinimumDepth {minimum_depth} is above MaximumDepth {maximum_depth}"
        )));
    }
    let number_of_executions = optional_u32(pass, "NumberOfExecutions", &ctx)?.unwrap_or(u32::MAX);
    if number_of_executions == 0 {
        return Err(ForgeError::malformed(format!("{ctx}: NumberOfExecutions must not be 0")));
    }

    file.write_id(pass_type.type_id());
    file.write_u32(payload.len() as u32);
    file.write_f32(minimum_depth);
    file.write_f32(maximum_depth);
    file.write_u32(number_of_executions);
    file.write_bool(optional_bool(pass, "SkipFirstExecution", &ctx)?.unwrap_or(false));
    file.write_bytes(&[0; 3]);
    file.write_bytes(payload.as_bytes());
    Ok(())
}

#[cfg(test)]
#[path = "../../../tests/unit/compiler/compositor/pass.rs"]
mod tests;
