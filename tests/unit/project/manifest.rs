use super::*;

fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "asset_forge_manifest_{}_{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn project_manifest_reads_pascal_case_members() {
    let path = temp_file(
        "Example.project",
        r#"{"Project": {"ProjectMetadata": {"Name": "Example"},
            "AssetsFilename": "Assets.json", "TargetsFilename": "Targets.json"}}"#,
    );
    let m = ProjectManifest::load(&path).unwrap();
    assert_eq!(m.project.project_metadata.name, "Example");
    assert_eq!(m.project.assets_filename, "Assets.json");
    assert_eq!(m.project.targets_filename, "Targets.json");
}

#[test]
fn empty_project_name_is_malformed() {
    let path = temp_file(
        "Empty.project",
        r#"{"Project": {"ProjectMetadata": {"Name": ""},
            "AssetsFilename": "a", "TargetsFilename": "t"}}"#,
    );
    let err = ProjectManifest::load(&path).unwrap_err();
    assert!(matches!(err, ForgeError::MalformedInput(_)));
}

#[test]
fn assets_table_accepts_wrapped_and_bare_forms() {
    let bare = temp_file("bare.json", r#"{"2": "b.asset", "1": "a.asset"}"#);
    let t = load_assets_table(&bare).unwrap();
    assert_eq!(t.keys().copied().collect::<Vec<_>>(), vec![1, 2]);

    let wrapped = temp_file(
        "wrapped.json",
        r#"{"Format": {"Type": "Assets", "Version": "1"}, "Assets": {"7": "x.asset"}}"#,
    );
    let t = load_assets_table(&wrapped).unwrap();
    assert_eq!(t.get(&7).map(String::as_str), Some("x.asset"));
}

#[test]
fn assets_table_rejects_non_numeric_ids() {
    let path = temp_file("bad.json", r#"{"abc": "x.asset"}"#);
    assert!(load_assets_table(&path).is_err());
}

#[test]
fn targets_resolve_texture_target_through_renderer_target() {
    let targets = Targets::from_value(serde_json::json!({
        "RendererTargets": {
            "Direct3D11_50": {"Platform": "Windows", "TextureTarget": "Desktop"}
        },
        "TextureTargets": {"Desktop": {"FileFormat": "dds"}}
    }))
    .unwrap();
    assert_eq!(targets.renderer_target("Direct3D11_50").unwrap().platform, "Windows");
    assert_eq!(targets.texture_target_for("Direct3D11_50").unwrap().file_format, "dds");
    assert!(matches!(
        targets.renderer_target("Vulkan").unwrap_err(),
        ForgeError::UnresolvedReference(_)
    ));
}
