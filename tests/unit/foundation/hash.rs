use super::*;

#[test]
fn fnv1a32_matches_reference_vectors() {
    assert_eq!(StringId::new("").as_u32(), 0x811C_9DC5);
    assert_eq!(StringId::new("a").as_u32(), 0xE40C_292C);
    assert_eq!(StringId::new("foobar").as_u32(), 0xBF9C_F968);
}

#[test]
fn string_id_is_usable_in_const_context() {
    const HERO: StringId = StringId::new("Example/Material/Character/Hero");
    assert_eq!(HERO.as_u32(), fnv1a32(b"Example/Material/Character/Hero"));
    assert_ne!(HERO, StringId::new("Example/Material/Character/Villain"));
}

#[test]
fn file_id_ignores_separator_style() {
    assert_eq!(
        file_id(Path::new("C:\\project\\a.png")),
        file_id(Path::new("C:/project/a.png"))
    );
    assert_ne!(
        file_id(Path::new("/project/a.png")),
        file_id(Path::new("/project/b.png"))
    );
}
