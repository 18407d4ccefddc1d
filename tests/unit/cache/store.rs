use super::*;

fn entry(target: &str, file_id: u64, hash: &str) -> CacheEntry {
    CacheEntry {
        file_id,
        build_target: target.to_string(),
        content_hash: hash.to_string(),
        file_size: 3,
        file_time: 1_700_000_000,
    }
}

#[test]
fn rows_are_keyed_by_target_and_file() {
    let mut t = CacheTable::default();
    t.upsert(entry("Direct3D11_50", 1, "aa"));
    t.upsert(entry("OpenGLES3_300", 1, "bb"));
    t.upsert(entry("Direct3D11_50", 1, "cc"));
    assert_eq!(t.len(), 2);
    assert_eq!(t.get("Direct3D11_50", 1).unwrap().content_hash, "cc");
    assert_eq!(t.get("OpenGLES3_300", 1).unwrap().content_hash, "bb");
    assert!(t.remove("OpenGLES3_300", 1));
    assert!(!t.remove("OpenGLES3_300", 1));
    assert!(t.get("OpenGLES3_300", 1).is_none());
}

#[test]
fn save_then_load_restores_rows() {
    let dir = std::env::temp_dir().join(format!("asset_forge_store_{}", std::process::id()));
    let path = dir.join("nested").join("Example.cache.json");
    let mut t = CacheTable::default();
    t.upsert(entry("Direct3D11_50", 7, "aa"));
    t.upsert(entry("Direct3D11_50", 3, "bb"));
    t.save(&path).unwrap();

    let loaded = CacheTable::load(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get("Direct3D11_50", 7), t.get("Direct3D11_50", 7));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn corrupt_tables_fail_to_load() {
    let path = std::env::temp_dir().join(format!("asset_forge_store_bad_{}.json", std::process::id()));
    std::fs::write(&path, "{ not json").unwrap();
    assert!(CacheTable::load(&path).is_err());
    std::fs::remove_file(&path).ok();
}
