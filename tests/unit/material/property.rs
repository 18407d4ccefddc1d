use super::*;

#[test]
fn enums_parse_their_upper_case_names() {
    assert_eq!(Usage::parse("SHADER_COMBINATION").unwrap(), Usage::ShaderCombination);
    assert_eq!(ValueType::parse("FLOAT_3_3").unwrap(), ValueType::Float3x3);
    assert_eq!(ValueType::Float4x4.name(), "FLOAT_4_4");
    assert!(matches!(
        Usage::parse("shader_uniform").unwrap_err(),
        ForgeError::MalformedInput(_)
    ));
}

#[test]
fn reference_usages_are_classified() {
    assert!(Usage::MaterialReference.is_reference());
    assert!(Usage::GlobalReferenceFallback.is_reference());
    assert!(!Usage::TextureReference.is_reference());
    assert!(!Usage::ShaderUniform.is_reference());
}

#[test]
fn literal_and_reference_constructors_check_usage() {
    let id = StringId::new("Gloss");
    assert!(MaterialProperty::literal(id, Usage::Static, MaterialPropertyValue::Float(1.0)).is_ok());
    assert!(
        MaterialProperty::literal(id, Usage::PassReference, MaterialPropertyValue::Float(1.0))
            .is_err()
    );
    assert!(
        MaterialProperty::reference(id, Usage::Static, ValueType::Float, StringId::new("X"))
            .is_err()
    );
}

#[test]
fn sorted_vector_keeps_unique_ids_in_order() {
    let mut v = SortedPropertyVector::new();
    for (name, x) in [("C", 3), ("A", 1), ("B", 2), ("A", 10)] {
        v.insert(
            MaterialProperty::literal(
                StringId::new(name),
                Usage::Static,
                MaterialPropertyValue::Integer(x),
            )
            .unwrap(),
        );
    }
    assert_eq!(v.len(), 3);
    assert!(v.iter().zip(v.iter().skip(1)).all(|(a, b)| a.id < b.id));
    assert_eq!(
        v.find(StringId::new("A")).unwrap().literal_value(),
        Some(MaterialPropertyValue::Integer(10))
    );
    assert!(v.find(StringId::new("D")).is_none());
}

#[test]
fn record_is_twenty_four_bytes() {
    let p = MaterialProperty::reference(
        StringId::new("WorldMatrix"),
        Usage::InstanceReference,
        ValueType::Float4x4,
        StringId::new("OBJECT_SPACE_TO_WORLD_SPACE_MATRIX"),
    )
    .unwrap();
    let mut f = MemoryFile::new();
    f.write(&p);
    let b = f.as_bytes();
    assert_eq!(b.len(), MATERIAL_PROPERTY_RECORD_SIZE);
    assert_eq!(&b[0..4], &StringId::new("WorldMatrix").as_u32().to_le_bytes());
    assert_eq!(b[4], Usage::InstanceReference as u8);
    assert_eq!(b[5], ValueType::Float4x4 as u8);
    assert_eq!(b[6], 0);
    assert_eq!(
        &b[8..12],
        &StringId::new("OBJECT_SPACE_TO_WORLD_SPACE_MATRIX").as_u32().to_le_bytes()
    );
    assert!(b[12..].iter().all(|&x| x == 0));
}

#[test]
fn float_vectors_are_little_endian_components() {
    let p = MaterialProperty::literal(
        StringId::new("Color"),
        Usage::ShaderUniform,
        MaterialPropertyValue::Float3([1.0, 0.5, 0.25]),
    )
    .unwrap();
    let mut f = MemoryFile::new();
    f.write(&p);
    let b = f.as_bytes();
    assert_eq!(&b[8..12], &1.0f32.to_le_bytes());
    assert_eq!(&b[12..16], &0.5f32.to_le_bytes());
    assert_eq!(&b[16..20], &0.25f32.to_le_bytes());
    assert_eq!(&b[20..24], &[0, 0, 0, 0]);
}

#[test]
fn matrices_only_have_uniform_sizes() {
    assert_eq!(ValueType::Float3x3.uniform_number_of_bytes(), 36);
    assert_eq!(ValueType::Float4x4.uniform_number_of_bytes(), 64);
    assert_eq!(ValueType::TextureAssetId.uniform_number_of_bytes(), 0);
    assert!(ValueType::CullMode.enumerators().is_some());
    assert!(ValueType::Float.enumerators().is_none());
}
