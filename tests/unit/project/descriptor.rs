use super::*;

fn descriptor(json: serde_json::Value) -> ForgeResult<AssetDescriptor> {
    AssetDescriptor::from_value(Path::new("/assets/Hero.asset"), json)
}

#[test]
fn reads_metadata_and_compiler_options() {
    let d = descriptor(serde_json::json!({
        "Format": {"Type": "Asset", "Version": "1"},
        "Asset": {
            "AssetMetadata": {
                "AssetId": "12", "AssetType": "Material",
                "AssetCategory": "Character", "AssetName": "Hero"
            },
            "MaterialAssetCompiler": {"InputFile": "Hero.material.json"}
        }
    }))
    .unwrap();

    assert_eq!(d.metadata().asset_id, 12);
    assert_eq!(d.metadata().logical_path("Example"), "Example/Material/Character/Hero");
    assert_eq!(d.compiler_section_name(), "MaterialAssetCompiler");
    assert_eq!(
        d.input_file().unwrap(),
        Path::new("/assets").join("Hero.material.json")
    );
}

#[test]
fn wrong_format_type_is_malformed() {
    let err = descriptor(serde_json::json!({
        "Format": {"Type": "Project", "Version": 1},
        "Asset": {}
    }))
    .unwrap_err();
    assert!(matches!(err, ForgeError::MalformedInput(_)));
}

#[test]
fn missing_compiler_section_is_malformed() {
    let d = descriptor(serde_json::json!({
        "Format": {"Type": "Asset", "Version": 1},
        "Asset": {"AssetMetadata": {
            "AssetId": 1, "AssetType": "Texture", "AssetCategory": "", "AssetName": "T"
        }}
    }))
    .unwrap();
    let err = d.input_file().unwrap_err();
    assert!(err.to_string().contains("TextureAssetCompiler"));
}
