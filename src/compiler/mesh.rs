use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::resource::format;
use crate::resource::writer::MemoryFile;

/// Position f32x3, normal f32x3, texture coordinate f32x2.
pub const NUMBER_OF_BYTES_PER_VERTEX: u32 = 32;

/// One imported sub-mesh with flattened, single-indexed attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedSubMesh {
    pub positions: Vec<[f32; 3]>,
    /// Empty, or one per position.
    pub normals: Vec<[f32; 3]>,
    /// Empty, or one per position.
    pub texcoords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Geometry produced by a [`MeshImporter`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedMesh {
    pub sub_meshes: Vec<ImportedSubMesh>,
}

/// Reads a mesh source file into vertex and index arrays.
pub trait MeshImporter: Send + Sync {
    fn import(&self, path: &Path) -> ForgeResult<ImportedMesh>;
}

/// Wavefront OBJ through `tobj`, triangulated and single-indexed.
pub struct ObjMeshImporter;

fn chunks<const N: usize>(flat: &[f32]) -> Vec<[f32; N]> {
    flat.chunks_exact(N)
        .map(|c| {
            let mut out = [0.0; N];
            out.copy_from_slice(c);
            out
        })
        .collect()
}

impl MeshImporter for ObjMeshImporter {
    fn import(&self, path: &Path) -> ForgeResult<ImportedMesh> {
        let (models, _materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
            .with_context(|| format!("import obj '{}'", path.display()))?;
        let sub_meshes = models
            .into_iter()
            .map(|model| {
                let mesh = model.mesh;
                ImportedSubMesh {
                    positions: chunks::<3>(&mesh.positions),
                    normals: chunks::<3>(&mesh.normals),
                    texcoords: chunks::<2>(&mesh.texcoords),
                    indices: mesh.indices,
                }
            })
            .collect();
        Ok(ImportedMesh { sub_meshes })
    }
}

pub(crate) struct MeshCompiler {
    importer: Box<dyn MeshImporter>,
}

impl MeshCompiler {
    pub(crate) fn new(importer: Box<dyn MeshImporter>) -> Self {
        Self { importer }
    }
}

/// Serialize `mesh` into the mesh payload.
///
/// Header `{bytesPerVertex, numberOfVertices, bytesPerIndex, numberOfIndices,
/// numberOfSubMeshes}`, bounding box min/max, sub-meshes `{materialAssetId,
/// startIndexLocation, numberOfIndices}`, vertices, indices.
pub(crate) fn write_mesh(mesh: &ImportedMesh, sub_mesh_materials: &[StringId]) -> ForgeResult<MemoryFile> {
    let number_of_vertices: usize = mesh.sub_meshes.iter().map(|s| s.positions.len()).sum();
    let number_of_indices: usize = mesh.sub_meshes.iter().map(|s| s.indices.len()).sum();
    let number_of_vertices = u32::try_from(number_of_vertices)
        .map_err(|_| ForgeError::malformed("mesh has too many vertices"))?;
    let bytes_per_index: u32 = if number_of_vertices <= u32::from(u16::MAX) { 2 } else { 4 };

    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for p in mesh.sub_meshes.iter().flat_map(|s| &s.positions) {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    if number_of_vertices == 0 {
        min = [0.0; 3];
        max = [0.0; 3];
    }

    let mut file = MemoryFile::new();
    file.write_u32(NUMBER_OF_BYTES_PER_VERTEX);
    file.write_u32(number_of_vertices);
    file.write_u32(bytes_per_index);
    file.write_u32(number_of_indices as u32);
    file.write_u32(mesh.sub_meshes.len() as u32);
    for v in min.iter().chain(&max) {
        file.write_f32(*v);
    }

    let mut start = 0u32;
    for (i, sub) in mesh.sub_meshes.iter().enumerate() {
        file.write_id(
            sub_mesh_materials
                .get(i)
                .copied()
                .unwrap_or(StringId::UNINITIALIZED),
        );
        file.write_u32(start);
        file.write_u32(sub.indices.len() as u32);
        start += sub.indices.len() as u32;
    }

    for sub in &mesh.sub_meshes {
        for (i, p) in sub.positions.iter().enumerate() {
            let n = sub.normals.get(i).copied().unwrap_or([0.0; 3]);
            let t = sub.texcoords.get(i).copied().unwrap_or([0.0; 2]);
            for c in p.iter().chain(&n).chain(&t) {
                file.write_f32(*c);
            }
        }
    }

    let mut base_vertex = 0u32;
    for sub in &mesh.sub_meshes {
        for &index in &sub.indices {
            if index as usize >= sub.positions.len() {
                return Err(ForgeError::malformed(format!(
                    "mesh index {index} is out of range for {} vertices",
                    sub.positions.len()
                )));
            }
            let index = base_vertex + index;
            if bytes_per_index == 2 {
                file.write_u16(index as u16);
            } else {
                file.write_u32(index);
            }
        }
        base_vertex += sub.positions.len() as u32;
    }
    Ok(file)
}

impl AssetCompiler for MeshCompiler {
    fn type_name(&self) -> &'static str {
        "Mesh"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".mesh")?;
        if input.needs_to_be_compiled(configuration, &target, &[]) {
            let options = configuration.descriptor.compiler_options()?;
            let sub_mesh_materials = match options.get("SubMeshMaterials") {
                None => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|v| input.resolver.resolve_json(v, "SubMeshMaterials"))
                    .collect::<ForgeResult<Vec<_>>>()?,
                Some(_) => {
                    return Err(ForgeError::malformed(
                        "SubMeshMaterials must be an array of source asset ids",
                    ));
                }
            };

            let mesh = self.importer.import(&target.input_file)?;
            write_mesh(&mesh, &sub_mesh_materials)?.finalize_as(format::MESH, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compiler/mesh.rs"]
mod tests;
