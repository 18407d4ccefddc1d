//! Typed, usage-tagged material properties and the sorted vector they live in.

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::resource::writer::{BinaryWrite, MemoryFile};

/// Hash of a material property name.
pub type MaterialPropertyId = StringId;

/// Size of one serialized [`MaterialProperty`] record.
pub const MATERIAL_PROPERTY_RECORD_SIZE: usize = 24;

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name { $($variant),+ }

        impl $name {
            const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Upper-case name as written in source documents.
            pub const fn name(self) -> &'static str {
                match self { $($name::$variant => $text),+ }
            }

            /// Parse the upper-case name.
            pub fn parse(s: &str) -> ForgeResult<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name() == s)
                    .ok_or_else(|| {
                        ForgeError::malformed(format!(
                            "unknown {} '{s}'",
                            stringify!($name)
                        ))
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_enum! {
    /// How the runtime consumes a property.
    pub enum Usage {
        Unknown = "UNKNOWN",
        Static = "STATIC",
        ShaderUniform = "SHADER_UNIFORM",
        ShaderCombination = "SHADER_COMBINATION",
        RasterizerState = "RASTERIZER_STATE",
        DepthStencilState = "DEPTH_STENCIL_STATE",
        BlendState = "BLEND_STATE",
        SamplerState = "SAMPLER_STATE",
        TextureReference = "TEXTURE_REFERENCE",
        GlobalReference = "GLOBAL_REFERENCE",
        UnknownReference = "UNKNOWN_REFERENCE",
        PassReference = "PASS_REFERENCE",
        MaterialReference = "MATERIAL_REFERENCE",
        InstanceReference = "INSTANCE_REFERENCE",
        GlobalReferenceFallback = "GLOBAL_REFERENCE_FALLBACK",
    }
}

impl Usage {
    /// Usages whose value is the id of another property rather than a literal.
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            Usage::GlobalReference
                | Usage::UnknownReference
                | Usage::PassReference
                | Usage::MaterialReference
                | Usage::InstanceReference
                | Usage::GlobalReferenceFallback
        )
    }
}

named_enum! {
    /// Data type of a property value.
    pub enum ValueType {
        Unknown = "UNKNOWN",
        Boolean = "BOOLEAN",
        Integer = "INTEGER",
        Integer2 = "INTEGER_2",
        Integer3 = "INTEGER_3",
        Integer4 = "INTEGER_4",
        Float = "FLOAT",
        Float2 = "FLOAT_2",
        Float3 = "FLOAT_3",
        Float4 = "FLOAT_4",
        Float3x3 = "FLOAT_3_3",
        Float4x4 = "FLOAT_4_4",
        FillMode = "FILL_MODE",
        CullMode = "CULL_MODE",
        ConservativeRasterizationMode = "CONSERVATIVE_RASTERIZATION_MODE",
        DepthWriteMask = "DEPTH_WRITE_MASK",
        StencilOp = "STENCIL_OP",
        ComparisonFunc = "COMPARISON_FUNC",
        Blend = "BLEND",
        BlendOp = "BLEND_OP",
        FilterMode = "FILTER_MODE",
        TextureAddressMode = "TEXTURE_ADDRESS_MODE",
        TextureAssetId = "TEXTURE_ASSET_ID",
        GlobalMaterialPropertyId = "GLOBAL_MATERIAL_PROPERTY_ID",
    }
}

impl ValueType {
    /// Bytes the value occupies inside a uniform buffer; `0` when it cannot live in one.
    pub const fn uniform_number_of_bytes(self) -> u32 {
        match self {
            ValueType::Boolean | ValueType::Integer | ValueType::Float => 4,
            ValueType::Integer2 | ValueType::Float2 => 8,
            ValueType::Integer3 | ValueType::Float3 => 12,
            ValueType::Integer4 | ValueType::Float4 => 16,
            ValueType::Float3x3 => 36,
            ValueType::Float4x4 => 64,
            _ => 0,
        }
    }

    /// `(name, runtime value)` table of fixed-function state enumerations.
    pub(crate) const fn enumerators(self) -> Option<&'static [(&'static str, u8)]> {
        match self {
            ValueType::FillMode => Some(&[("WIREFRAME", 2), ("SOLID", 3)]),
            ValueType::CullMode => Some(&[("NONE", 1), ("FRONT", 2), ("BACK", 3)]),
            ValueType::ConservativeRasterizationMode => Some(&[("OFF", 0), ("ON", 1)]),
            ValueType::DepthWriteMask => Some(&[("ZERO", 0), ("ALL", 1)]),
            ValueType::StencilOp => Some(&[
                ("KEEP", 1),
                ("ZERO", 2),
                ("REPLACE", 3),
                ("INCR_SAT", 4),
                ("DECR_SAT", 5),
                ("INVERT", 6),
                ("INCREASE", 7),
                ("DECREASE", 8),
            ]),
            ValueType::ComparisonFunc => Some(&[
                ("NEVER", 1),
                ("LESS", 2),
                ("EQUAL", 3),
                ("LESS_EQUAL", 4),
                ("GREATER", 5),
                ("NOT_EQUAL", 6),
                ("GREATER_EQUAL", 7),
                ("ALWAYS", 8),
            ]),
            ValueType::Blend => Some(&[
                ("ZERO", 1),
                ("ONE", 2),
                ("SRC_COLOR", 3),
                ("INV_SRC_COLOR", 4),
                ("SRC_ALPHA", 5),
                ("INV_SRC_ALPHA", 6),
                ("DEST_ALPHA", 7),
                ("INV_DEST_ALPHA", 8),
                ("DEST_COLOR", 9),
                ("INV_DEST_COLOR", 10),
                ("SRC_ALPHA_SAT", 11),
                ("BLEND_FACTOR", 14),
                ("INV_BLEND_FACTOR", 15),
                ("SRC_1_COLOR", 16),
                ("INV_SRC_1_COLOR", 17),
                ("SRC_1_ALPHA", 18),
                ("INV_SRC_1_ALPHA", 19),
            ]),
            ValueType::BlendOp => Some(&[
                ("ADD", 1),
                ("SUBTRACT", 2),
                ("REV_SUBTRACT", 3),
                ("MIN", 4),
                ("MAX", 5),
            ]),
            ValueType::FilterMode => Some(&[
                ("MIN_MAG_MIP_POINT", 0x00),
                ("MIN_MAG_POINT_MIP_LINEAR", 0x01),
                ("MIN_POINT_MAG_LINEAR_MIP_POINT", 0x04),
                ("MIN_POINT_MAG_MIP_LINEAR", 0x05),
                ("MIN_LINEAR_MAG_MIP_POINT", 0x10),
                ("MIN_LINEAR_MAG_POINT_MIP_LINEAR", 0x11),
                ("MIN_MAG_LINEAR_MIP_POINT", 0x14),
                ("MIN_MAG_MIP_LINEAR", 0x15),
                ("ANISOTROPIC", 0x55),
                ("COMPARISON_MIN_MAG_MIP_POINT", 0x80),
                ("COMPARISON_MIN_MAG_MIP_LINEAR", 0x95),
                ("COMPARISON_ANISOTROPIC", 0xd5),
            ]),
            ValueType::TextureAddressMode => Some(&[
                ("WRAP", 1),
                ("MIRROR", 2),
                ("CLAMP", 3),
                ("BORDER", 4),
                ("MIRROR_ONCE", 5),
            ]),
            _ => None,
        }
    }
}

/// A literal property value; the variant determines the value type.
///
/// Matrices have no literal form, so they only ever appear as references.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialPropertyValue {
    Boolean(bool),
    Integer(i32),
    Integer2([i32; 2]),
    Integer3([i32; 3]),
    Integer4([i32; 4]),
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    /// Fixed-function state enumerator: value type plus runtime value.
    State(ValueType, u8),
    TextureAssetId(StringId),
    GlobalMaterialPropertyId(MaterialPropertyId),
}

impl MaterialPropertyValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Boolean(_) => ValueType::Boolean,
            Self::Integer(_) => ValueType::Integer,
            Self::Integer2(_) => ValueType::Integer2,
            Self::Integer3(_) => ValueType::Integer3,
            Self::Integer4(_) => ValueType::Integer4,
            Self::Float(_) => ValueType::Float,
            Self::Float2(_) => ValueType::Float2,
            Self::Float3(_) => ValueType::Float3,
            Self::Float4(_) => ValueType::Float4,
            Self::State(vt, _) => *vt,
            Self::TextureAssetId(_) => ValueType::TextureAssetId,
            Self::GlobalMaterialPropertyId(_) => ValueType::GlobalMaterialPropertyId,
        }
    }

    fn to_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        let mut put = |i: usize, b: [u8; 4]| out[i * 4..i * 4 + 4].copy_from_slice(&b);
        match self {
            Self::Boolean(b) => put(0, u32::from(b).to_le_bytes()),
            Self::Integer(v) => put(0, v.to_le_bytes()),
            Self::Integer2(v) => v.iter().enumerate().for_each(|(i, c)| put(i, c.to_le_bytes())),
            Self::Integer3(v) => v.iter().enumerate().for_each(|(i, c)| put(i, c.to_le_bytes())),
            Self::Integer4(v) => v.iter().enumerate().for_each(|(i, c)| put(i, c.to_le_bytes())),
            Self::Float(v) => put(0, v.to_le_bytes()),
            Self::Float2(v) => v.iter().enumerate().for_each(|(i, c)| put(i, c.to_le_bytes())),
            Self::Float3(v) => v.iter().enumerate().for_each(|(i, c)| put(i, c.to_le_bytes())),
            Self::Float4(v) => v.iter().enumerate().for_each(|(i, c)| put(i, c.to_le_bytes())),
            Self::State(_, v) => put(0, u32::from(v).to_le_bytes()),
            Self::TextureAssetId(id) | Self::GlobalMaterialPropertyId(id) => {
                put(0, id.as_u32().to_le_bytes())
            }
        }
        out
    }
}

/// Either a literal or the id of the property it refers to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    Literal(MaterialPropertyValue),
    Reference {
        value_type: ValueType,
        target: MaterialPropertyId,
    },
}

impl PropertyValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Literal(v) => v.value_type(),
            Self::Reference { value_type, .. } => *value_type,
        }
    }
}

/// One named, usage-tagged property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialProperty {
    pub id: MaterialPropertyId,
    pub usage: Usage,
    pub value: PropertyValue,
    /// Set when a material overrides the value it inherited.
    pub overwritten: bool,
}

impl MaterialProperty {
    /// A literal property. Reference usages are rejected.
    pub fn literal(
        id: MaterialPropertyId,
        usage: Usage,
        value: MaterialPropertyValue,
    ) -> ForgeResult<Self> {
        if usage.is_reference() {
            return Err(ForgeError::malformed(format!(
                "usage {usage} needs a '@' reference value"
            )));
        }
        Ok(Self {
            id,
            usage,
            value: PropertyValue::Literal(value),
            overwritten: false,
        })
    }

    /// A reference property. Only reference usages are accepted.
    pub fn reference(
        id: MaterialPropertyId,
        usage: Usage,
        value_type: ValueType,
        target: MaterialPropertyId,
    ) -> ForgeResult<Self> {
        if !usage.is_reference() {
            return Err(ForgeError::malformed(format!(
                "usage {usage} cannot hold a reference"
            )));
        }
        Ok(Self {
            id,
            usage,
            value: PropertyValue::Reference { value_type, target },
            overwritten: false,
        })
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// Literal value, if this is not a reference.
    pub fn literal_value(&self) -> Option<MaterialPropertyValue> {
        match self.value {
            PropertyValue::Literal(v) => Some(v),
            PropertyValue::Reference { .. } => None,
        }
    }
}

impl BinaryWrite for MaterialProperty {
    fn write_to(&self, out: &mut MemoryFile) {
        out.write_id(self.id);
        out.write_u8(self.usage as u8);
        out.write_u8(self.value_type() as u8);
        out.write_bool(self.overwritten);
        out.write_u8(0);
        let value = match self.value {
            PropertyValue::Literal(v) => v.to_bytes(),
            PropertyValue::Reference { target, .. } => {
                let mut b = [0u8; 16];
                b[..4].copy_from_slice(&target.as_u32().to_le_bytes());
                b
            }
        };
        out.write_bytes(&value);
    }
}

/// Properties kept unique and ordered by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SortedPropertyVector {
    properties: Vec<MaterialProperty>,
}

impl SortedPropertyVector {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: MaterialPropertyId) -> Result<usize, usize> {
        self.properties.binary_search_by_key(&id, |p| p.id)
    }

    pub fn find(&self, id: MaterialPropertyId) -> Option<&MaterialProperty> {
        self.position(id).ok().map(|i| &self.properties[i])
    }

    pub fn find_mut(&mut self, id: MaterialPropertyId) -> Option<&mut MaterialProperty> {
        match self.position(id) {
            Ok(i) => Some(&mut self.properties[i]),
            Err(_) => None,
        }
    }

    /// Insert or replace by id; returns the replaced property.
    pub fn insert(&mut self, property: MaterialProperty) -> Option<MaterialProperty> {
        match self.position(property.id) {
            Ok(i) => Some(std::mem::replace(&mut self.properties[i], property)),
            Err(i) => {
                self.properties.insert(i, property);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MaterialProperty> {
        self.properties.iter()
    }

    pub fn as_slice(&self) -> &[MaterialProperty] {
        &self.properties
    }
}

impl<'a> IntoIterator for &'a SortedPropertyVector {
    type Item = &'a MaterialProperty;
    type IntoIter = std::slice::Iter<'a, MaterialProperty>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/material/property.rs"]
mod tests;
