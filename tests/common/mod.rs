#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

pub fn temp_dir(prefix: &str) -> PathBuf {
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

pub fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Route pipeline logs through the test harness; `RUST_LOG` is not consulted.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub const RENDERER_TARGET: &str = "Direct3D11_50";

/// Throwaway project on disk: manifest, targets and assets tables, one directory per asset.
pub struct ProjectBuilder {
    pub dir: PathBuf,
    assets: BTreeMap<u32, String>,
}

impl ProjectBuilder {
    pub fn new(prefix: &str) -> Self {
        Self {
            dir: temp_dir(prefix),
            assets: BTreeMap::new(),
        }
    }

    /// Write `<Type>/<name>.asset` and its input file `<Type>/<input_name>`.
    pub fn asset(
        &mut self,
        id: u32,
        ty: &str,
        name: &str,
        input_name: &str,
        input: &[u8],
        options: Value,
    ) -> PathBuf {
        let relative = format!("{ty}/{name}.asset");
        let descriptor_path = self.dir.join(&relative);
        let mut compiler_options = json!({"InputFile": input_name});
        if let Value::Object(extra) = options {
            compiler_options.as_object_mut().unwrap().extend(extra);
        }
        write_json(
            &descriptor_path,
            &json!({
                "Format": {"Type": "Asset", "Version": 1},
                "Asset": {
                    "AssetMetadata": {"AssetId": id, "AssetType": ty,
                                      "AssetCategory": "Core", "AssetName": name},
                    format!("{ty}AssetCompiler"): compiler_options
                }
            }),
        );
        let input_path = self.dir.join(ty).join(input_name);
        std::fs::write(&input_path, input).unwrap();
        self.assets.insert(id, relative);
        input_path
    }

    /// JSON asset whose input document is `{"Format": {...}, "<format>": body}`.
    pub fn json_asset(&mut self, id: u32, ty: &str, name: &str, format: &str, body: Value) -> PathBuf {
        let doc = json!({"Format": {"Type": format, "Version": 1}, format: body});
        let bytes = serde_json::to_vec_pretty(&doc).unwrap();
        self.asset(id, ty, name, &format!("{name}.json"), &bytes, json!({}))
    }

    /// Write manifest, targets and assets tables; returns the manifest path.
    pub fn finish(&self) -> PathBuf {
        write_json(
            &self.dir.join("Example.project"),
            &json!({"Project": {"ProjectMetadata": {"Name": "Example"},
                                "AssetsFilename": "Assets.json",
                                "TargetsFilename": "Targets.json"}}),
        );
        write_json(
            &self.dir.join("Targets.json"),
            &json!({
                "RendererTargets": {
                    RENDERER_TARGET: {"Platform": "Windows", "TextureTarget": "Desktop"}
                },
                "TextureTargets": {"Desktop": {"FileFormat": "dds"}}
            }),
        );
        let assets: serde_json::Map<String, Value> = self
            .assets
            .iter()
            .map(|(id, path)| (id.to_string(), Value::String(path.clone())))
            .collect();
        write_json(
            &self.dir.join("Assets.json"),
            &json!({"Format": {"Type": "Assets", "Version": 1}, "Assets": assets}),
        );
        self.dir.join("Example.project")
    }
}
