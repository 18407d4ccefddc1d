//! Parsing of declarative property lists.
//!
//! A property entry is `{"Usage", "ValueType", "Value"}` plus, for shader combination
//! properties, `VisualImportance` and `MaximumIntegerValue`. `Value` is either a literal
//! parsed per value type, `@Name` (a reference, or a copy of an already declared
//! property's value for non-reference usages), or `@counter(Name)`.

use serde_json::{Map, Value};

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::foundation::json::{float_components, int_components, parse_bool};
use crate::material::property::{
    MaterialProperty, MaterialPropertyValue, PropertyValue, SortedPropertyVector, Usage,
    ValueType,
};
use crate::material::shader_properties::{MANDATORY_SHADER_PROPERTY, ShaderProperties};
use crate::project::resolver::AssetIdentityResolver;

/// Textures the runtime creates itself; referenced by name instead of by source id.
pub const BUILT_IN_TEXTURES: [&str; 4] = [
    "Engine/Texture/DynamicByCode/WhiteMap2D",
    "Engine/Texture/DynamicByCode/BlackMap2D",
    "Engine/Texture/DynamicByCode/IdentityNormalMap2D",
    "Engine/Texture/DynamicByCode/IdentityDepthMap2D",
];

/// Maps a `TEXTURE_ASSET_ID` literal to a compiled asset id.
pub trait TextureAssetResolver {
    fn resolve_texture(&self, literal: &str, ctx: &str) -> ForgeResult<StringId>;
}

impl TextureAssetResolver for AssetIdentityResolver {
    fn resolve_texture(&self, literal: &str, ctx: &str) -> ForgeResult<StringId> {
        if BUILT_IN_TEXTURES.contains(&literal) {
            return Ok(StringId::new(literal));
        }
        self.resolve_json(&Value::String(literal.to_string()), ctx)
    }
}

/// A property plus the shader-combination side tables it contributes to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParsedProperty {
    pub property: MaterialProperty,
    pub visual_importance: Option<i32>,
    pub maximum_integer_value: Option<i32>,
}

/// Source text of a JSON scalar: strings as-is, numbers printed, booleans upper-case.
pub(crate) fn value_text(value: &Value, ctx: &str) -> ForgeResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("TRUE".to_string()),
        Value::Bool(false) => Ok("FALSE".to_string()),
        _ => Err(ForgeError::malformed(format!(
            "{ctx}: value must be a string, number or boolean"
        ))),
    }
}

pub(crate) fn counter_name(text: &str) -> Option<&str> {
    text.strip_prefix("@counter(")?.strip_suffix(')').map(str::trim)
}

fn find_in<'s>(
    scopes: &[&'s SortedPropertyVector],
    id: StringId,
) -> Option<&'s MaterialProperty> {
    scopes.iter().find_map(|s| s.find(id))
}

/// Stateful property parser; owns nothing but borrows the `@counter` table.
pub struct PropertyReader<'a> {
    textures: &'a dyn TextureAssetResolver,
    counters: &'a mut ShaderProperties,
}

impl<'a> PropertyReader<'a> {
    pub fn new(textures: &'a dyn TextureAssetResolver, counters: &'a mut ShaderProperties) -> Self {
        Self { textures, counters }
    }

    /// Evaluate `@counter(name)`: current value, then increment.
    pub fn next_counter(&mut self, name: &str) -> i32 {
        self.counters.post_increment(StringId::new(name))
    }

    /// Parse a literal of `value_type`.
    pub fn parse_literal(
        &mut self,
        value_type: ValueType,
        text: &str,
        ctx: &str,
    ) -> ForgeResult<MaterialPropertyValue> {
        let text = text.trim();
        let bad = |what: &str| ForgeError::malformed(format!("{ctx}: invalid {what} '{text}'"));
        Ok(match value_type {
            ValueType::Boolean => {
                MaterialPropertyValue::Boolean(parse_bool(text).ok_or_else(|| bad("boolean"))?)
            }
            ValueType::Integer => {
                MaterialPropertyValue::Integer(text.parse().map_err(|_| bad("integer"))?)
            }
            ValueType::Integer2 => MaterialPropertyValue::Integer2(int_components(text, ctx)?),
            ValueType::Integer3 => MaterialPropertyValue::Integer3(int_components(text, ctx)?),
            ValueType::Integer4 => MaterialPropertyValue::Integer4(int_components(text, ctx)?),
            ValueType::Float => {
                MaterialPropertyValue::Float(text.parse().map_err(|_| bad("float"))?)
            }
            ValueType::Float2 => MaterialPropertyValue::Float2(float_components(text, ctx)?),
            ValueType::Float3 => MaterialPropertyValue::Float3(float_components(text, ctx)?),
            ValueType::Float4 => MaterialPropertyValue::Float4(float_components(text, ctx)?),
            ValueType::Float3x3 | ValueType::Float4x4 => {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: {value_type} has no literal form, use a reference"
                )));
            }
            ValueType::TextureAssetId => {
                MaterialPropertyValue::TextureAssetId(self.textures.resolve_texture(text, ctx)?)
            }
            ValueType::GlobalMaterialPropertyId => {
                MaterialPropertyValue::GlobalMaterialPropertyId(StringId::new(text))
            }
            ValueType::Unknown => {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: value type UNKNOWN cannot hold a value"
                )));
            }
            state => {
                let table = state.enumerators().unwrap_or(&[]);
                let (_, v) = table
                    .iter()
                    .find(|(name, _)| *name == text)
                    .ok_or_else(|| bad(state.name()))?;
                MaterialPropertyValue::State(state, *v)
            }
        })
    }

    /// Parse the `Value` text of a property with a known usage and value type.
    ///
    /// `@Name` is looked up in `scopes` in order.
    pub fn parse_value(
        &mut self,
        usage: Usage,
        value_type: ValueType,
        text: &str,
        scopes: &[&SortedPropertyVector],
        ctx: &str,
    ) -> ForgeResult<PropertyValue> {
        if let Some(counter) = counter_name(text) {
            if usage.is_reference() || value_type != ValueType::Integer {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: @counter needs a non-reference INTEGER property"
                )));
            }
            let n = self.next_counter(counter);
            return Ok(PropertyValue::Literal(MaterialPropertyValue::Integer(n)));
        }

        let Some(name) = text.strip_prefix('@') else {
            if usage.is_reference() {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: usage {usage} needs a '@' reference, got '{text}'"
                )));
            }
            return self
                .parse_literal(value_type, text, ctx)
                .map(PropertyValue::Literal);
        };

        let target = StringId::new(name);
        let found = find_in(scopes, target);
        if let Some(p) = found
            && p.value_type() != value_type
        {
            return Err(ForgeError::type_mismatch(format!(
                "{ctx}: '@{name}' is {} but {value_type} is expected",
                p.value_type()
            )));
        }

        if usage.is_reference() {
            if usage == Usage::MaterialReference && found.is_none() {
                return Err(ForgeError::unresolved(format!(
                    "{ctx}: material property '@{name}' is unknown"
                )));
            }
            return Ok(PropertyValue::Reference { value_type, target });
        }

        let p = found.ok_or_else(|| {
            ForgeError::unresolved(format!("{ctx}: property '@{name}' is unknown"))
        })?;
        match p.value {
            PropertyValue::Literal(v) => Ok(PropertyValue::Literal(v)),
            PropertyValue::Reference { .. } => Err(ForgeError::malformed(format!(
                "{ctx}: '@{name}' is a reference and cannot be copied into usage {usage}"
            ))),
        }
    }

    /// Parse one full property entry.
    pub fn read_property(
        &mut self,
        name: &str,
        entry: &Value,
        scopes: &[&SortedPropertyVector],
    ) -> ForgeResult<ParsedProperty> {
        let ctx = format!("property '{name}'");
        if !entry.is_object() {
            return Err(ForgeError::malformed(format!(
                "{ctx}: expected {{Usage, ValueType, Value}}"
            )));
        }
        let field = |key: &str| -> ForgeResult<&Value> {
            entry
                .get(key)
                .ok_or_else(|| ForgeError::malformed(format!("{ctx}: missing mandatory '{key}'")))
        };
        let usage = Usage::parse(&value_text(field("Usage")?, &ctx)?)
            .map_err(|e| ForgeError::malformed(format!("{ctx}: {e}")))?;
        let value_type = ValueType::parse(&value_text(field("ValueType")?, &ctx)?)
            .map_err(|e| ForgeError::malformed(format!("{ctx}: {e}")))?;

        match usage {
            Usage::TextureReference if value_type != ValueType::TextureAssetId => {
                return Err(ForgeError::type_mismatch(format!(
                    "{ctx}: usage TEXTURE_REFERENCE needs value type TEXTURE_ASSET_ID, got {value_type}"
                )));
            }
            Usage::ShaderCombination
                if !matches!(value_type, ValueType::Boolean | ValueType::Integer) =>
            {
                return Err(ForgeError::type_mismatch(format!(
                    "{ctx}: usage SHADER_COMBINATION needs BOOLEAN or INTEGER, got {value_type}"
                )));
            }
            _ => {}
        }

        let text = value_text(field("Value")?, &ctx)?;
        let value = self.parse_value(usage, value_type, &text, scopes, &ctx)?;
        let property = MaterialProperty {
            id: StringId::new(name),
            usage,
            value,
            overwritten: false,
        };

        let visual_importance = match entry.get("VisualImportance") {
            None => None,
            Some(_) if usage != Usage::ShaderCombination => {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: VisualImportance is only valid for SHADER_COMBINATION properties"
                )));
            }
            Some(v) => {
                let t = value_text(v, &ctx)?;
                if t == "MANDATORY" {
                    Some(MANDATORY_SHADER_PROPERTY)
                } else {
                    Some(t.trim().parse().map_err(|_| {
                        ForgeError::malformed(format!("{ctx}: invalid VisualImportance '{t}'"))
                    })?)
                }
            }
        };

        let needs_maximum =
            usage == Usage::ShaderCombination && value_type == ValueType::Integer;
        let maximum_integer_value = match (entry.get("MaximumIntegerValue"), needs_maximum) {
            (None, false) => None,
            (None, true) => {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: INTEGER shader combination properties need MaximumIntegerValue"
                )));
            }
            (Some(_), false) => {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: MaximumIntegerValue is only valid for INTEGER shader combination properties"
                )));
            }
            (Some(v), true) => {
                let t = value_text(v, &ctx)?;
                Some(t.trim().parse().map_err(|_| {
                    ForgeError::malformed(format!("{ctx}: invalid MaximumIntegerValue '{t}'"))
                })?)
            }
        };

        Ok(ParsedProperty {
            property,
            visual_importance,
            maximum_integer_value,
        })
    }

    /// Read a `Properties` object into `out`, filling the shader-combination side tables.
    ///
    /// Entries may reference properties declared earlier in the same object.
    pub fn read_properties(
        &mut self,
        properties: &Map<String, Value>,
        out: &mut SortedPropertyVector,
        visual_importance: &mut ShaderProperties,
        maximum_integer_value: &mut ShaderProperties,
    ) -> ForgeResult<()> {
        for (name, entry) in properties {
            let parsed = self.read_property(name, entry, &[&*out])?;
            let id = parsed.property.id;
            out.insert(parsed.property);
            if let Some(v) = parsed.visual_importance {
                visual_importance.set(id, v);
            }
            if let Some(v) = parsed.maximum_integer_value {
                maximum_integer_value.set(id, v);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/material/reader.rs"]
mod tests;
