//! Shared fixtures for unit tests: a temporary project directory with a resolver that
//! knows every asset written into it.

use std::path::PathBuf;

use serde_json::{Value, json};

use crate::project::descriptor::AssetMetadata;
use crate::project::resolver::{AssetIdentityResolver, SourceAssetId};

pub(crate) fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "asset_forge_{prefix}_{}_{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub(crate) struct Fixture {
    pub dir: PathBuf,
    pub resolver: AssetIdentityResolver,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        Self {
            dir: temp_dir(name),
            resolver: AssetIdentityResolver::new("Example"),
        }
    }

    /// Write `<name>.json` and `<name>.asset`, and register the asset.
    pub fn add(&mut self, id: u32, ty: &str, name: &str, input: Value) -> PathBuf {
        let input_name = format!("{name}.json");
        std::fs::write(self.dir.join(&input_name), input.to_string()).unwrap();
        let descriptor = json!({
            "Format": {"Type": "Asset", "Version": 1},
            "Asset": {
                "AssetMetadata": {"AssetId": id, "AssetType": ty,
                                  "AssetCategory": "Test", "AssetName": name},
                format!("{ty}AssetCompiler"): {"InputFile": input_name}
            }
        });
        let path = self.dir.join(format!("{name}.asset"));
        std::fs::write(&path, descriptor.to_string()).unwrap();
        self.resolver
            .insert(
                SourceAssetId(id),
                path.clone(),
                AssetMetadata {
                    asset_id: id,
                    asset_type: ty.to_string(),
                    asset_category: "Test".to_string(),
                    asset_name: name.to_string(),
                },
            )
            .unwrap();
        path
    }

    pub fn add_blueprint(&mut self, id: u32, properties: Value) {
        self.add(
            id,
            "MaterialBlueprint",
            &format!("Blueprint{id}"),
            json!({
                "Format": {"Type": "MaterialBlueprintAsset", "Version": 1},
                "MaterialBlueprintAsset": {"Properties": properties}
            }),
        );
    }

    pub fn add_material(&mut self, id: u32, name: &str, body: Value) {
        self.add(
            id,
            "Material",
            name,
            json!({"Format": {"Type": "MaterialAsset", "Version": 1}, "MaterialAsset": body}),
        );
    }
}
