use super::*;

fn meta(id: u32, ty: &str, name: &str) -> AssetMetadata {
    AssetMetadata {
        asset_id: id,
        asset_type: ty.to_string(),
        asset_category: "Test".to_string(),
        asset_name: name.to_string(),
    }
}

#[test]
fn compiled_id_hashes_the_logical_path() {
    let mut r = AssetIdentityResolver::new("Example");
    let id = r
        .insert(SourceAssetId(5), "/p/Hero.asset", meta(5, "Material", "Hero"))
        .unwrap();
    assert_eq!(id, StringId::new("Example/Material/Test/Hero"));
    assert_eq!(r.compiled_asset_id(SourceAssetId(5)).unwrap(), id);
    assert_eq!(
        r.absolute_filename(SourceAssetId(5)).unwrap(),
        Path::new("/p/Hero.asset")
    );
    assert_eq!(r.asset(SourceAssetId(5)).unwrap().logical_path, "Example/Material/Test/Hero");
}

#[test]
fn unknown_source_id_is_unresolved() {
    let r = AssetIdentityResolver::new("Example");
    let err = r.compiled_asset_id(SourceAssetId(17)).unwrap_err();
    assert!(matches!(err, ForgeError::UnresolvedReference(_)));
    assert!(err.to_string().contains("source asset ID 17 is unknown"));
}

#[test]
fn resolve_json_accepts_numbers_and_strings() {
    let mut r = AssetIdentityResolver::new("Example");
    let id = r
        .insert(SourceAssetId(3), "/p/T.asset", meta(3, "Texture", "T"))
        .unwrap();
    assert_eq!(r.resolve_json(&serde_json::json!(3), "ctx").unwrap(), id);
    assert_eq!(r.resolve_json(&serde_json::json!("3"), "ctx").unwrap(), id);
    assert!(r.resolve_json(&serde_json::json!("x"), "ctx").is_err());
    assert!(r.resolve_json(&serde_json::json!(4), "ctx").is_err());
}

#[test]
fn duplicate_logical_paths_are_rejected() {
    let mut r = AssetIdentityResolver::new("Example");
    r.insert(SourceAssetId(1), "/p/a.asset", meta(1, "Mesh", "Same"))
        .unwrap();
    assert!(
        r.insert(SourceAssetId(2), "/p/b.asset", meta(2, "Mesh", "Same"))
            .is_err()
    );
    assert_eq!(r.len(), 1);
}
