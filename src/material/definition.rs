//! Loading material blueprints and materials from their source documents.
//!
//! Materials, scenes and compositor quad passes all need the fully resolved property
//! vector of some blueprint or material, so loading lives here rather than in the
//! compilers.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::foundation::json::{check_format, mandatory, optional_bool, optional_object, read_json};
use crate::material::property::{
    MaterialProperty, MaterialPropertyId, SortedPropertyVector, Usage,
};
use crate::material::reader::{PropertyReader, TextureAssetResolver, value_text};
use crate::material::shader_properties::ShaderProperties;
use crate::material::uniform_buffer::{UniformBuffer, read_uniform_buffers};
use crate::project::descriptor::AssetDescriptor;
use crate::project::resolver::{AssetIdentityResolver, ResolvedAsset, SourceAssetId};
use crate::resource::format;

/// Shader combination properties a blueprint may declare without opting in.
pub const MAXIMUM_NUMBER_OF_SHADER_COMBINATION_PROPERTIES: usize = 4;

/// A parsed material blueprint.
#[derive(Clone, Debug)]
pub struct BlueprintDefinition {
    pub compiled_id: StringId,
    pub logical_path: String,
    pub properties: SortedPropertyVector,
    pub visual_importance: ShaderProperties,
    pub maximum_integer_value: ShaderProperties,
    pub vertex_shader_blueprint: StringId,
    pub fragment_shader_blueprint: StringId,
    pub uniform_buffers: Vec<UniformBuffer>,
    /// Descriptor and input files the definition was read from.
    pub source_files: Vec<PathBuf>,
}

impl BlueprintDefinition {
    pub fn number_of_shader_combination_properties(&self) -> usize {
        self.properties
            .iter()
            .filter(|p| p.usage == Usage::ShaderCombination)
            .count()
    }
}

/// A material with its blueprint defaults and base-material chain applied.
#[derive(Clone, Debug)]
pub struct MaterialDefinition {
    pub compiled_id: StringId,
    pub logical_path: String,
    pub blueprint_source_id: SourceAssetId,
    pub blueprint_compiled_id: StringId,
    pub properties: SortedPropertyVector,
    /// Logical path of the asset that first declared each property.
    pub declared_by: HashMap<MaterialPropertyId, String>,
    /// Descriptor and input files of the material, its bases and its blueprint.
    pub source_files: Vec<PathBuf>,
}

fn expect_type<'r>(
    resolver: &'r AssetIdentityResolver,
    source_id: SourceAssetId,
    asset_type: &str,
    ctx: &str,
) -> ForgeResult<&'r ResolvedAsset> {
    let asset = resolver.asset(source_id).map_err(|_| {
        ForgeError::unresolved(format!("{ctx}: source asset ID {source_id} is unknown"))
    })?;
    if asset.metadata.asset_type != asset_type {
        return Err(ForgeError::malformed(format!(
            "{ctx}: asset {source_id} is a {}, expected a {asset_type}",
            asset.metadata.asset_type
        )));
    }
    Ok(asset)
}

fn read_input(asset: &ResolvedAsset, format_name: &str) -> ForgeResult<(Value, Vec<PathBuf>)> {
    let descriptor = AssetDescriptor::load(&asset.descriptor_path)?;
    let input = descriptor.input_file()?;
    let doc = read_json(&input)?;
    check_format(&doc, format_name, 1).map_err(|e| e.in_asset(&input))?;
    Ok((doc, vec![asset.descriptor_path.clone(), input]))
}

/// Parse the body of a `MaterialBlueprintAsset` document.
pub fn parse_blueprint(
    doc: &Value,
    resolver: &AssetIdentityResolver,
    compiled_id: StringId,
    logical_path: &str,
) -> ForgeResult<BlueprintDefinition> {
    let body = mandatory(doc, format::MATERIAL_BLUEPRINT.name, "document")?;
    let allow_crazy = optional_bool(body, "AllowCrazyNumberOfShaderCombinations", "blueprint")?
        .unwrap_or(false);

    let mut counters = ShaderProperties::new();
    let mut reader = PropertyReader::new(resolver, &mut counters);
    let mut properties = SortedPropertyVector::new();
    let mut visual_importance = ShaderProperties::new();
    let mut maximum_integer_value = ShaderProperties::new();
    if let Some(obj) = optional_object(body, "Properties", "blueprint")? {
        reader.read_properties(
            obj,
            &mut properties,
            &mut visual_importance,
            &mut maximum_integer_value,
        )?;
    }

    let shader = |key: &str| -> ForgeResult<StringId> {
        match body.get(key) {
            None => Ok(StringId::UNINITIALIZED),
            Some(v) => resolver.resolve_json(v, key),
        }
    };
    let vertex_shader_blueprint = shader("VertexShaderBlueprint")?;
    let fragment_shader_blueprint = shader("FragmentShaderBlueprint")?;

    let uniform_buffers = match optional_object(body, "UniformBuffers", "blueprint")? {
        Some(obj) => read_uniform_buffers(obj, &mut reader, &properties)?,
        None => Vec::new(),
    };

    let definition = BlueprintDefinition {
        compiled_id,
        logical_path: logical_path.to_string(),
        properties,
        visual_importance,
        maximum_integer_value,
        vertex_shader_blueprint,
        fragment_shader_blueprint,
        uniform_buffers,
        source_files: Vec::new(),
    };

    let n = definition.number_of_shader_combination_properties();
    if n > MAXIMUM_NUMBER_OF_SHADER_COMBINATION_PROPERTIES && !allow_crazy {
        return Err(ForgeError::policy(format!(
            "material blueprint '{logical_path}' declares {n} shader combination properties, \
             at most {MAXIMUM_NUMBER_OF_SHADER_COMBINATION_PROPERTIES} are allowed unless \
             AllowCrazyNumberOfShaderCombinations is set"
        )));
    }
    Ok(definition)
}

/// Load the material blueprint with the given source id.
pub fn load_blueprint(
    resolver: &AssetIdentityResolver,
    source_id: SourceAssetId,
) -> ForgeResult<BlueprintDefinition> {
    let asset = expect_type(resolver, source_id, "MaterialBlueprint", "material blueprint")?;
    let (doc, files) = read_input(asset, format::MATERIAL_BLUEPRINT.name)?;
    let mut definition = parse_blueprint(&doc, resolver, asset.compiled_id, &asset.logical_path)
        .map_err(|e| e.in_asset(&files[1]))?;
    definition.source_files = files;
    Ok(definition)
}

/// Load a material, following `BaseMaterial` links down to the blueprint.
pub fn load_material(
    resolver: &AssetIdentityResolver,
    source_id: SourceAssetId,
) -> ForgeResult<MaterialDefinition> {
    load_material_chain(resolver, source_id, &mut Vec::new())
}

fn source_id_member(body: &Value, key: &str) -> ForgeResult<Option<SourceAssetId>> {
    body.get(key)
        .map(|v| SourceAssetId::from_json(v, key))
        .transpose()
}

fn load_material_chain(
    resolver: &AssetIdentityResolver,
    source_id: SourceAssetId,
    visiting: &mut Vec<SourceAssetId>,
) -> ForgeResult<MaterialDefinition> {
    if visiting.contains(&source_id) {
        return Err(ForgeError::malformed(format!(
            "material {source_id} inherits from itself through BaseMaterial"
        )));
    }
    visiting.push(source_id);

    let asset = expect_type(resolver, source_id, "Material", "material")?;
    let (doc, files) = read_input(asset, format::MATERIAL.name)?;
    let input = files[1].clone();
    let body = mandatory(&doc, format::MATERIAL.name, "document").map_err(|e| e.in_asset(&input))?;
    let base_id = source_id_member(body, "BaseMaterial").map_err(|e| e.in_asset(&input))?;
    let explicit_blueprint =
        source_id_member(body, "MaterialBlueprint").map_err(|e| e.in_asset(&input))?;

    let mut definition = match base_id {
        Some(base_id) => {
            let base = load_material_chain(resolver, base_id, visiting)?;
            if let Some(bp) = explicit_blueprint
                && bp != base.blueprint_source_id
            {
                return Err(ForgeError::malformed(format!(
                    "material '{}' uses blueprint {bp} but its base material '{}' uses {}",
                    asset.logical_path, base.logical_path, base.blueprint_source_id
                ))
                .in_asset(&input));
            }
            base
        }
        None => {
            let bp_id = explicit_blueprint.ok_or_else(|| {
                ForgeError::malformed(format!(
                    "material '{}' needs MaterialBlueprint or BaseMaterial",
                    asset.logical_path
                ))
                .in_asset(&input)
            })?;
            let blueprint = load_blueprint(resolver, bp_id)?;
            let declared_by = blueprint
                .properties
                .iter()
                .map(|p| (p.id, blueprint.logical_path.clone()))
                .collect();
            MaterialDefinition {
                compiled_id: asset.compiled_id,
                logical_path: asset.logical_path.clone(),
                blueprint_source_id: bp_id,
                blueprint_compiled_id: blueprint.compiled_id,
                properties: blueprint.properties,
                declared_by,
                source_files: blueprint.source_files,
            }
        }
    };
    definition.compiled_id = asset.compiled_id;
    definition.logical_path = asset.logical_path.clone();
    definition.source_files.extend(files);

    if let Some(obj) = body.get("Properties").and_then(Value::as_object) {
        apply_material_properties(resolver, obj, &mut definition).map_err(|e| e.in_asset(&input))?;
    }

    visiting.pop();
    Ok(definition)
}

/// Describe a declaration for mismatch messages: `FLOAT (STATIC)`.
fn describe(p: &MaterialProperty) -> String {
    format!("{} ({})", p.value_type(), p.usage)
}

fn apply_material_properties(
    resolver: &AssetIdentityResolver,
    properties: &Map<String, Value>,
    definition: &mut MaterialDefinition,
) -> ForgeResult<()> {
    let mut counters = ShaderProperties::new();
    let mut reader = PropertyReader::new(resolver, &mut counters);
    for (name, entry) in properties {
        let id = StringId::new(name);
        let existing = definition.properties.find(id).copied();

        let mut property = if entry.is_object() {
            let parsed = reader.read_property(name, entry, &[&definition.properties])?;
            if let Some(existing) = existing
                && (existing.value_type() != parsed.property.value_type()
                    || existing.usage != parsed.property.usage)
            {
                let other = definition
                    .declared_by
                    .get(&id)
                    .map_or("<unknown>", String::as_str);
                return Err(ForgeError::type_mismatch(format!(
                    "material property '{name}' is declared as {} by '{other}' but as {} by '{}'",
                    describe(&existing),
                    describe(&parsed.property),
                    definition.logical_path
                )));
            }
            parsed.property
        } else {
            let existing = existing.ok_or_else(|| {
                ForgeError::unresolved(format!(
                    "material property '{name}' of '{}' is not declared by its blueprint, \
                     use the full {{Usage, ValueType, Value}} form",
                    definition.logical_path
                ))
            })?;
            let ctx = format!("property '{name}'");
            let text = value_text(entry, &ctx)?;
            let value = reader.parse_value(
                existing.usage,
                existing.value_type(),
                &text,
                &[&definition.properties],
                &ctx,
            )?;
            MaterialProperty { value, ..existing }
        };

        if existing.is_some() {
            property.overwritten = true;
        } else {
            definition
                .declared_by
                .insert(id, definition.logical_path.clone());
        }
        definition.properties.insert(property);
    }
    Ok(())
}

/// Apply short-form `{"Name": "value"}` overrides to a copy of `properties`.
///
/// Returns the overridden properties sorted by id; every name must already be declared.
pub fn apply_property_overrides(
    textures: &dyn TextureAssetResolver,
    overrides: &Map<String, Value>,
    properties: &SortedPropertyVector,
    owner: &str,
) -> ForgeResult<SortedPropertyVector> {
    let mut counters = ShaderProperties::new();
    let mut reader = PropertyReader::new(textures, &mut counters);
    let mut out = SortedPropertyVector::new();
    for (name, entry) in overrides {
        let existing = properties.find(StringId::new(name)).ok_or_else(|| {
            ForgeError::unresolved(format!(
                "material property '{name}' is not declared by '{owner}'"
            ))
        })?;
        let ctx = format!("property '{name}'");
        let text = value_text(entry, &ctx)?;
        let value = reader.parse_value(
            existing.usage,
            existing.value_type(),
            &text,
            &[properties],
            &ctx,
        )?;
        out.insert(MaterialProperty {
            value,
            overwritten: true,
            ..*existing
        });
    }
    Ok(out)
}

/// Blueprint a material ends up on, following `BaseMaterial` links without applying any
/// properties. `None` when the chain is unreadable or cyclic.
fn sibling_blueprint(
    resolver: &AssetIdentityResolver,
    source_id: SourceAssetId,
    body: &Value,
) -> Option<SourceAssetId> {
    let mut visited = vec![source_id];
    let mut body = body.clone();
    loop {
        if let Ok(Some(bp)) = source_id_member(&body, "MaterialBlueprint") {
            return Some(bp);
        }
        let base_id = source_id_member(&body, "BaseMaterial").ok()??;
        if visited.contains(&base_id) {
            return None;
        }
        visited.push(base_id);
        let base = resolver.asset(base_id).ok()?;
        let (doc, _) = read_input(base, format::MATERIAL.name).ok()?;
        body = doc.get(format::MATERIAL.name)?.clone();
    }
}

/// Reject full-form declarations that disagree with another material of the same blueprint,
/// whether that material names the blueprint itself or inherits it through `BaseMaterial`.
///
/// Materials that cannot be read are ignored here; they fail on their own compile.
pub fn check_sibling_declarations(
    resolver: &AssetIdentityResolver,
    material: SourceAssetId,
    definition: &MaterialDefinition,
) -> ForgeResult<()> {
    let own: Vec<&MaterialProperty> = definition
        .properties
        .iter()
        .filter(|p| definition.declared_by.get(&p.id) == Some(&definition.logical_path))
        .collect();
    if own.is_empty() {
        return Ok(());
    }

    for sibling in resolver.iter() {
        if sibling.source_id == material || sibling.metadata.asset_type != "Material" {
            continue;
        }
        let Ok((doc, _)) = read_input(sibling, format::MATERIAL.name) else {
            continue;
        };
        let Some(body) = doc.get(format::MATERIAL.name) else {
            continue;
        };
        let blueprint = sibling_blueprint(resolver, sibling.source_id, body);
        if blueprint != Some(definition.blueprint_source_id) {
            continue;
        }
        let Some(props) = body.get("Properties").and_then(Value::as_object) else {
            continue;
        };

        let mut counters = ShaderProperties::new();
        let mut reader = PropertyReader::new(resolver, &mut counters);
        for mine in &own {
            let Some((name, entry)) = props.iter().find(|(k, _)| StringId::new(k) == mine.id)
            else {
                continue;
            };
            if !entry.is_object() {
                continue;
            }
            let Ok(theirs) = reader.read_property(name, entry, &[&definition.properties]) else {
                continue;
            };
            if theirs.property.value_type() != mine.value_type()
                || theirs.property.usage != mine.usage
            {
                return Err(ForgeError::type_mismatch(format!(
                    "material property '{name}' is declared as {} by '{}' but as {} by '{}'",
                    describe(mine),
                    definition.logical_path,
                    describe(&theirs.property),
                    sibling.logical_path
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/material/definition.rs"]
mod tests;
