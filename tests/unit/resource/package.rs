use super::*;

#[test]
fn records_are_sorted_and_unique() {
    let mut p = AssetPackage::new();
    p.add_asset(StringId(30), "c.mesh").unwrap();
    p.add_asset(StringId(10), "a.material").unwrap();
    p.add_asset(StringId(20), "b.texture").unwrap();
    p.add_asset(StringId(10), "a2.material").unwrap();

    assert_eq!(p.len(), 3);
    let ids: Vec<u32> = p.iter().map(|a| a.asset_id.as_u32()).collect();
    assert_eq!(ids, vec![10, 20, 30]);
    assert_eq!(p.get(StringId(10)).unwrap().filename, "a2.material");
}

#[test]
fn payload_layout_is_fixed_size() {
    let mut p = AssetPackage::new();
    p.add_asset(StringId(1), "x").unwrap();
    p.add_asset(StringId(2), "y").unwrap();
    let f = p.to_memory_file().unwrap();
    assert_eq!(f.len(), 4 + 2 * (4 + MAXIMUM_ASSET_FILENAME_LENGTH));
    assert_eq!(AssetPackage::from_payload(f.as_bytes()).unwrap(), p);
}

#[test]
fn overlong_filenames_are_rejected() {
    let mut p = AssetPackage::new();
    let name = "n".repeat(MAXIMUM_ASSET_FILENAME_LENGTH);
    assert!(p.add_asset(StringId(1), name).is_err());
    assert!(p.is_empty());
}
