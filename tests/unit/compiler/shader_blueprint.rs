use super::*;
use crate::project::descriptor::AssetMetadata;

fn resolver_with_piece(id: u32) -> (AssetIdentityResolver, StringId) {
    let mut r = AssetIdentityResolver::new("Example");
    let compiled = r
        .insert(
            SourceAssetId(id),
            "/p/Piece.asset",
            AssetMetadata {
                asset_id: id,
                asset_type: "ShaderPiece".to_string(),
                asset_category: "Core".to_string(),
                asset_name: "Lighting".to_string(),
            },
        )
        .unwrap();
    (r, compiled)
}

#[test]
fn includes_and_properties_are_collected_once() {
    let (r, piece) = resolver_with_piece(4);
    let source = "@includepiece(4)\n@property(UseNormalMap) x @property( Gloss ) @property(UseNormalMap)\n@includepiece( 4 )";
    let (pieces, properties) = scan_shader_blueprint(source, &r).unwrap();
    assert_eq!(pieces, vec![piece]);
    assert_eq!(
        properties,
        vec![StringId::new("UseNormalMap"), StringId::new("Gloss")]
    );
}

#[test]
fn unknown_piece_is_unresolved() {
    let (r, _) = resolver_with_piece(4);
    let err = scan_shader_blueprint("@includepiece(5)", &r).unwrap_err();
    assert!(matches!(err, ForgeError::UnresolvedReference(_)));
}

#[test]
fn unterminated_instruction_is_malformed() {
    let (r, _) = resolver_with_piece(4);
    let err = scan_shader_blueprint("@property(Gloss", &r).unwrap_err();
    assert!(matches!(err, ForgeError::MalformedInput(_)));
}

#[test]
fn payload_ends_with_the_same_terminated_source_as_a_piece() {
    let (r, piece) = resolver_with_piece(4);
    let source = "@includepiece(4)\n@property(Gloss)";
    let (pieces, properties) = scan_shader_blueprint(source, &r).unwrap();

    let mut file = MemoryFile::new();
    write_shader_blueprint(&mut file, &pieces, &properties, source);
    let bytes = file.as_bytes();

    assert_eq!(&bytes[0..2], &1u16.to_le_bytes());
    assert_eq!(&bytes[2..4], &1u16.to_le_bytes());
    assert_eq!(&bytes[4..8], &(source.len() as u32 + 1).to_le_bytes());
    assert_eq!(&bytes[8..12], &piece.0.to_le_bytes());
    assert_eq!(&bytes[12..16], &StringId::new("Gloss").0.to_le_bytes());

    let mut tail = MemoryFile::new();
    write_source_code(&mut tail, source);
    assert_eq!(&bytes[16..], tail.as_bytes());
    assert_eq!(bytes.last(), Some(&0));
}
