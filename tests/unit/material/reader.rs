use super::*;
use serde_json::json;

struct FixedTextures;

impl TextureAssetResolver for FixedTextures {
    fn resolve_texture(&self, literal: &str, ctx: &str) -> ForgeResult<StringId> {
        match literal {
            "7" => Ok(StringId(0x77)),
            _ => Err(ForgeError::unresolved(format!("{ctx}: texture {literal}"))),
        }
    }
}

fn read(props: serde_json::Value) -> ForgeResult<(SortedPropertyVector, ShaderProperties, ShaderProperties)> {
    let mut counters = ShaderProperties::new();
    let mut reader = PropertyReader::new(&FixedTextures, &mut counters);
    let mut out = SortedPropertyVector::new();
    let mut vi = ShaderProperties::new();
    let mut max = ShaderProperties::new();
    reader.read_properties(props.as_object().unwrap(), &mut out, &mut vi, &mut max)?;
    Ok((out, vi, max))
}

fn literal(v: &SortedPropertyVector, name: &str) -> MaterialPropertyValue {
    v.find(StringId::new(name)).unwrap().literal_value().unwrap()
}

#[test]
fn literals_are_parsed_per_value_type() {
    let (v, _, _) = read(json!({
        "Flag": {"Usage": "STATIC", "ValueType": "BOOLEAN", "Value": "TRUE"},
        "Count": {"Usage": "STATIC", "ValueType": "INTEGER", "Value": 3},
        "Color": {"Usage": "SHADER_UNIFORM", "ValueType": "FLOAT_3", "Value": "1 0.5 0"},
        "Cull": {"Usage": "RASTERIZER_STATE", "ValueType": "CULL_MODE", "Value": "BACK"},
        "Albedo": {"Usage": "TEXTURE_REFERENCE", "ValueType": "TEXTURE_ASSET_ID", "Value": "7"},
        "Global": {"Usage": "STATIC", "ValueType": "GLOBAL_MATERIAL_PROPERTY_ID", "Value": "Time"}
    }))
    .unwrap();

    assert_eq!(literal(&v, "Flag"), MaterialPropertyValue::Boolean(true));
    assert_eq!(literal(&v, "Count"), MaterialPropertyValue::Integer(3));
    assert_eq!(literal(&v, "Color"), MaterialPropertyValue::Float3([1.0, 0.5, 0.0]));
    assert_eq!(literal(&v, "Cull"), MaterialPropertyValue::State(ValueType::CullMode, 3));
    assert_eq!(literal(&v, "Albedo"), MaterialPropertyValue::TextureAssetId(StringId(0x77)));
    assert_eq!(
        literal(&v, "Global"),
        MaterialPropertyValue::GlobalMaterialPropertyId(StringId::new("Time"))
    );
}

#[test]
fn unknown_enum_strings_are_malformed() {
    let err = read(json!({
        "Cull": {"Usage": "RASTERIZER_STATE", "ValueType": "CULL_MODE", "Value": "SIDEWAYS"}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::MalformedInput(_)));

    let err = read(json!({
        "X": {"Usage": "NOT_A_USAGE", "ValueType": "FLOAT", "Value": "1"}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::MalformedInput(_)));
}

#[test]
fn at_name_copies_an_earlier_value_with_the_same_type() {
    let (v, _, _) = read(json!({
        "Base": {"Usage": "STATIC", "ValueType": "FLOAT", "Value": "0.25"},
        "Copy": {"Usage": "SHADER_UNIFORM", "ValueType": "FLOAT", "Value": "@Base"}
    }))
    .unwrap();
    assert_eq!(literal(&v, "Copy"), MaterialPropertyValue::Float(0.25));
}

#[test]
fn at_name_with_a_different_type_is_a_type_mismatch() {
    let err = read(json!({
        "Base": {"Usage": "STATIC", "ValueType": "FLOAT", "Value": "0.25"},
        "Copy": {"Usage": "STATIC", "ValueType": "FLOAT_2", "Value": "@Base"}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::TypeMismatch(_)));
}

#[test]
fn unknown_at_name_is_unresolved() {
    let err = read(json!({
        "Copy": {"Usage": "STATIC", "ValueType": "FLOAT", "Value": "@Missing"}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::UnresolvedReference(_)));
    assert!(err.to_string().contains("Missing"));
}

#[test]
fn reference_usages_store_the_target_id() {
    let (v, _, _) = read(json!({
        "Matrix": {"Usage": "PASS_REFERENCE", "ValueType": "FLOAT_4_4",
                   "Value": "@WORLD_SPACE_TO_CLIP_SPACE_MATRIX"}
    }))
    .unwrap();
    let p = v.find(StringId::new("Matrix")).unwrap();
    assert_eq!(
        p.value,
        PropertyValue::Reference {
            value_type: ValueType::Float4x4,
            target: StringId::new("WORLD_SPACE_TO_CLIP_SPACE_MATRIX")
        }
    );
}

#[test]
fn matrix_literals_are_rejected() {
    let err = read(json!({
        "M": {"Usage": "SHADER_UNIFORM", "ValueType": "FLOAT_4_4", "Value": "1 0 0 0"}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::MalformedInput(_)));
}

#[test]
fn material_reference_must_exist_in_scope() {
    let err = read(json!({
        "R": {"Usage": "MATERIAL_REFERENCE", "ValueType": "FLOAT", "Value": "@Nope"}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::UnresolvedReference(_)));
}

#[test]
fn counter_post_increments() {
    let (v, _, _) = read(json!({
        "A": {"Usage": "STATIC", "ValueType": "INTEGER", "Value": "@counter(Slot)"},
        "B": {"Usage": "STATIC", "ValueType": "INTEGER", "Value": "@counter(Slot)"},
        "C": {"Usage": "STATIC", "ValueType": "INTEGER", "Value": "@counter(Other)"}
    }))
    .unwrap();
    assert_eq!(literal(&v, "A"), MaterialPropertyValue::Integer(0));
    assert_eq!(literal(&v, "B"), MaterialPropertyValue::Integer(1));
    assert_eq!(literal(&v, "C"), MaterialPropertyValue::Integer(0));
}

#[test]
fn shader_combination_side_tables() {
    let (_, vi, max) = read(json!({
        "UseNormalMap": {"Usage": "SHADER_COMBINATION", "ValueType": "BOOLEAN", "Value": "TRUE",
                         "VisualImportance": "MANDATORY"},
        "NumberOfLights": {"Usage": "SHADER_COMBINATION", "ValueType": "INTEGER", "Value": "2",
                           "VisualImportance": "10", "MaximumIntegerValue": "8"}
    }))
    .unwrap();
    assert_eq!(vi.get(StringId::new("UseNormalMap")), Some(MANDATORY_SHADER_PROPERTY));
    assert_eq!(vi.get(StringId::new("NumberOfLights")), Some(10));
    assert_eq!(max.get(StringId::new("NumberOfLights")), Some(8));
    assert_eq!(max.len(), 1);
}

#[test]
fn integer_combination_without_maximum_is_malformed() {
    let err = read(json!({
        "N": {"Usage": "SHADER_COMBINATION", "ValueType": "INTEGER", "Value": "1"}
    }))
    .unwrap_err();
    assert!(err.to_string().contains("MaximumIntegerValue"));
}

#[test]
fn usage_value_type_mismatch_is_rejected() {
    let err = read(json!({
        "T": {"Usage": "TEXTURE_REFERENCE", "ValueType": "FLOAT", "Value": "1"}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::TypeMismatch(_)));

    let err = read(json!({
        "C": {"Usage": "SHADER_COMBINATION", "ValueType": "FLOAT", "Value": "1"}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::TypeMismatch(_)));
}
