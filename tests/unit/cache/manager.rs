use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "asset_forge_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

const TARGET: &str = "Direct3D11_50";

#[test]
fn check_file_reports_missing_changed_unchanged() {
    let tmp = temp_dir("cache_check_file");
    std::fs::create_dir_all(&tmp).unwrap();
    let file = tmp.join("a.txt");
    let cache = BuildCache::in_memory();

    assert_eq!(cache.check_file(TARGET, &file), FileState::Missing);
    std::fs::write(&file, b"one").unwrap();
    assert_eq!(cache.check_file(TARGET, &file), FileState::Changed);
    assert_eq!(cache.check_file(TARGET, &file), FileState::Unchanged);
    assert_eq!(cache.check_file("OpenGLES3_300", &file), FileState::Changed);

    let row = cache.entry(TARGET, &file).unwrap();
    assert_eq!(row.file_size, 3);
    assert_eq!(row.build_target, TARGET);
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn invalidate_touched_forgets_rows_of_failed_compile() {
    let tmp = temp_dir("cache_invalidate");
    std::fs::create_dir_all(&tmp).unwrap();
    let a = tmp.join("a.txt");
    let b = tmp.join("b.txt");
    std::fs::write(&a, b"a").unwrap();
    std::fs::write(&b, b"b").unwrap();
    let cache = BuildCache::in_memory();

    cache.check_file(TARGET, &a);
    cache.begin_asset();
    cache.check_file(TARGET, &b);
    cache.invalidate_touched();

    assert!(cache.entry(TARGET, &a).is_some());
    assert!(cache.entry(TARGET, &b).is_none());
    assert_eq!(cache.check_file(TARGET, &b), FileState::Changed);
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn unreadable_table_fails_open() {
    let tmp = temp_dir("cache_fail_open");
    std::fs::create_dir_all(&tmp).unwrap();
    let file = tmp.join("a.txt");
    std::fs::write(&file, b"payload").unwrap();
    {
        let cache = BuildCache::open(&tmp.join("cache"), "Example");
        assert_eq!(cache.check_file(TARGET, &file), FileState::Changed);
    }
    assert!(tmp.join("cache").join("Example.cache.json").exists());

    std::fs::write(tmp.join("cache").join("Example.cache.json"), b"garbage").unwrap();
    let cache = BuildCache::open(&tmp.join("cache"), "Example");
    assert_eq!(cache.check_file(TARGET, &file), FileState::Changed);
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn shared_dependency_is_tracked_per_destination() {
    let tmp = temp_dir("cache_shared_dependency");
    std::fs::create_dir_all(&tmp).unwrap();
    let manifest = tmp.join("a.asset");
    let (a, b, shared) = (tmp.join("a.src"), tmp.join("b.src"), tmp.join("shared.src"));
    let (out_a, out_b) = (tmp.join("a.out"), tmp.join("b.out"));
    for f in [&manifest, &a, &b, &shared, &out_a, &out_b] {
        std::fs::write(f, b"x").unwrap();
    }
    let cache = BuildCache::in_memory();
    let check = |src: &Path, out: &Path| {
        cache.needs_to_be_compiled_with_dependencies(TARGET, &manifest, &[src, &shared], out)
    };
    check(&a, &out_a);
    check(&b, &out_b);
    assert!(!check(&a, &out_a));
    assert!(!check(&b, &out_b));

    std::fs::write(&shared, b"y").unwrap();
    assert!(check(&a, &out_a));
    assert!(check(&b, &out_b));
    assert!(!check(&a, &out_a));
    std::fs::remove_dir_all(&tmp).ok();
}
