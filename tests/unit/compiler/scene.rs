use super::*;
use crate::resource::reader::BinaryReader;
use crate::test_support::Fixture;
use serde_json::json;

fn scene(nodes: serde_json::Value) -> serde_json::Value {
    json!({"Format": {"Type": "SceneAsset", "Version": 1}, "SceneAsset": {"Nodes": nodes}})
}

#[test]
fn node_transform_defaults_and_item_records() {
    let mut f = Fixture::new("scene_items");
    f.add(10, "Mesh", "Crate", json!({}));
    let doc = scene(json!([
        {
            "Position": "1 2 3",
            "Items": {
                "Camera": {},
                "Light": {"LightType": "SPOT", "Color": [0.5, 0.5, 0.5], "Radius": 4.0},
                "Mesh": {"MeshAssetId": 10}
            }
        }
    ]));
    let (file, dependencies) = write_scene(&doc, &f.resolver).unwrap();
    assert!(dependencies.is_empty());

    let mut r = BinaryReader::new(file.as_bytes());
    assert_eq!(r.read_u32().unwrap(), 1);
    let transform: Vec<f32> = (0..10).map(|_| r.read_f32().unwrap()).collect();
    assert_eq!(transform, [1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    assert_eq!(r.read_u32().unwrap(), 3);

    assert_eq!(r.read_u32().unwrap(), StringId::new("CameraSceneItem").0);
    assert_eq!(r.read_u32().unwrap(), 0);

    assert_eq!(r.read_u32().unwrap(), StringId::new("LightSceneItem").0);
    assert_eq!(r.read_u32().unwrap(), 20);
    assert_eq!(r.read_u32().unwrap(), 2);
    r.read_bytes(12).unwrap();
    assert_eq!(r.read_f32().unwrap(), 4.0);

    assert_eq!(r.read_u32().unwrap(), StringId::new("MeshSceneItem").0);
    assert_eq!(r.read_u32().unwrap(), 8);
    assert_eq!(
        r.read_u32().unwrap(),
        StringId::new("Example/Mesh/Test/Crate").0
    );
    assert_eq!(r.read_u32().unwrap(), 0);
    assert_eq!(r.remaining(), 0);
}

#[test]
fn unknown_item_type_is_malformed() {
    let f = Fixture::new("scene_unknown");
    let doc = scene(json!([{"Items": {"Teapot#1": {}}}]));
    let err = write_scene(&doc, &f.resolver).unwrap_err();
    assert!(matches!(err.root(), ForgeError::MalformedInput(_)), "{err}");
    assert!(err.to_string().contains("Teapot"));
}

#[test]
fn unknown_mesh_reference_is_unresolved() {
    let f = Fixture::new("scene_unresolved");
    let doc = scene(json!([{"Items": {"Mesh": {"MeshAssetId": 99}}}]));
    let err = write_scene(&doc, &f.resolver).unwrap_err();
    assert!(matches!(err.root(), ForgeError::UnresolvedReference(_)), "{err}");
}

#[test]
fn material_item_overrides_become_dependencies() {
    let mut f = Fixture::new("scene_material");
    f.add_blueprint(
        1,
        json!({"Tint": {"Usage": "SHADER_UNIFORM", "ValueType": "FLOAT_3", "Value": "1 1 1"}}),
    );
    f.add_material(2, "Red", json!({"MaterialBlueprint": 1}));
    let doc = scene(json!([
        {"Items": {"Material": {"MaterialAssetId": 2, "Properties": {"Tint": "1 0 0"}}}}
    ]));
    let (file, dependencies) = write_scene(&doc, &f.resolver).unwrap();
    assert!(dependencies.iter().any(|p| p.ends_with("Blueprint1.json")));
    assert!(dependencies.iter().any(|p| p.ends_with("Red.json")));

    let mut r = BinaryReader::new(file.as_bytes());
    r.read_bytes(4 + 40 + 4).unwrap();
    assert_eq!(r.read_u32().unwrap(), StringId::new("MaterialSceneItem").0);
    assert_eq!(r.read_u32().unwrap(), 8 + 24);
    assert_eq!(r.read_u32().unwrap(), StringId::new("Example/Material/Test/Red").0);
    assert_eq!(r.read_u32().unwrap(), 1);
}
