use super::*;
use crate::resource::reader::BinaryReader;

fn triangle() -> ImportedSubMesh {
    ImportedSubMesh {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, -1.0]],
        normals: vec![],
        texcoords: vec![],
        indices: vec![0, 1, 2],
    }
}

#[test]
fn small_meshes_use_sixteen_bit_indices() {
    let mesh = ImportedMesh {
        sub_meshes: vec![triangle(), triangle()],
    };
    let file = write_mesh(&mesh, &[StringId(9)]).unwrap();
    let mut r = BinaryReader::new(file.as_bytes());
    assert_eq!(r.read_u32().unwrap(), NUMBER_OF_BYTES_PER_VERTEX);
    assert_eq!(r.read_u32().unwrap(), 6);
    assert_eq!(r.read_u32().unwrap(), 2);
    assert_eq!(r.read_u32().unwrap(), 6);
    assert_eq!(r.read_u32().unwrap(), 2);
    let bounds: Vec<f32> = (0..6).map(|_| r.read_f32().unwrap()).collect();
    assert_eq!(bounds, vec![0.0, 0.0, -1.0, 1.0, 2.0, 0.0]);
    // sub-mesh table
    assert_eq!(r.read_u32().unwrap(), 9);
    assert_eq!(r.read_u32().unwrap(), 0);
    assert_eq!(r.read_u32().unwrap(), 3);
    assert_eq!(r.read_u32().unwrap(), StringId::UNINITIALIZED.as_u32());
    assert_eq!(r.read_u32().unwrap(), 3);
    assert_eq!(r.read_u32().unwrap(), 3);
    r.read_bytes(6 * NUMBER_OF_BYTES_PER_VERTEX as usize).unwrap();
    let indices: Vec<u16> = (0..6).map(|_| r.read_u16().unwrap()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(r.remaining(), 0);
}

#[test]
fn large_meshes_use_thirty_two_bit_indices() {
    let sub = ImportedSubMesh {
        positions: vec![[0.0; 3]; 70_000],
        indices: vec![0, 69_999, 1],
        ..ImportedSubMesh::default()
    };
    let file = write_mesh(&ImportedMesh { sub_meshes: vec![sub] }, &[]).unwrap();
    let mut r = BinaryReader::new(file.as_bytes());
    r.read_u32().unwrap();
    r.read_u32().unwrap();
    assert_eq!(r.read_u32().unwrap(), 4);
}

#[test]
fn out_of_range_indices_are_malformed() {
    let mut sub = triangle();
    sub.indices.push(3);
    let err = write_mesh(&ImportedMesh { sub_meshes: vec![sub] }, &[]).unwrap_err();
    assert!(matches!(err, ForgeError::MalformedInput(_)));
}

#[test]
fn obj_importer_reads_a_quad() {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "asset_forge_quad_{}_{nanos}.obj",
        std::process::id()
    ));
    std::fs::write(
        &path,
        "o Quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
    )
    .unwrap();
    let mesh = ObjMeshImporter.import(&path).unwrap();
    assert_eq!(mesh.sub_meshes.len(), 1);
    assert_eq!(mesh.sub_meshes[0].positions.len(), 4);
    assert_eq!(mesh.sub_meshes[0].indices.len(), 6);
}
