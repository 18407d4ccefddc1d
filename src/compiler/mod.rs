//! Compiler dispatch: the contract every asset compiler implements and the registry the
//! project driver looks compilers up in.
//!
//! Every compiler runs the same three phases:
//! 1. derive the absolute input and output filenames from the descriptor
//! 2. ask the build cache whether the output is stale, and rebuild it if so
//! 3. add the asset to the output package, whether or not it was rebuilt

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cache::manager::BuildCache;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::project::descriptor::AssetDescriptor;
use crate::project::manifest::Targets;
use crate::project::resolver::{AssetIdentityResolver, compiled_asset_id};
use crate::resource::package::AssetPackage;

pub(crate) mod compositor;
pub(crate) mod compositor_workspace;
pub(crate) mod material;
pub(crate) mod material_blueprint;
pub(crate) mod mesh;
pub(crate) mod scene;
pub(crate) mod shader_blueprint;
pub(crate) mod shader_piece;
pub(crate) mod skeleton_animation;
pub(crate) mod texture;

pub use mesh::{ImportedMesh, ImportedSubMesh, MeshImporter, ObjMeshImporter};
pub use skeleton_animation::{ImportedSkeletonAnimation, SkeletonAnimationImporter};

/// FNV-1a 32 of the asset type name a compiler handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetCompilerTypeId(pub StringId);

impl AssetCompilerTypeId {
    pub const fn new(asset_type: &str) -> Self {
        Self(StringId::new(asset_type))
    }
}

/// Project-wide inputs shared by every compiler call.
pub struct CompilerInput<'a> {
    pub project_name: &'a str,
    /// Directory of the descriptor being compiled.
    pub input_directory: &'a Path,
    /// Root output directory; assets land under `<output>/<project>/...`.
    pub output_directory: &'a Path,
    pub resolver: &'a AssetIdentityResolver,
    pub cache: &'a BuildCache,
    /// Rebuild even when the cache reports the output as current.
    pub force: bool,
}

/// Per-asset configuration.
pub struct CompilerConfiguration<'a> {
    pub descriptor: &'a AssetDescriptor,
    pub targets: &'a Targets,
    /// Active renderer target; selects the platform and texture variant.
    pub renderer_target: &'a str,
}

/// Where compilers report what they produced.
pub struct CompilerOutput<'a> {
    pub package: &'a mut AssetPackage,
    /// Output files rebuilt during this call.
    pub compiled_files: Vec<PathBuf>,
}

impl<'a> CompilerOutput<'a> {
    pub fn new(package: &'a mut AssetPackage) -> Self {
        Self {
            package,
            compiled_files: Vec::new(),
        }
    }

    /// Phase 3: record the asset in the package.
    pub(crate) fn add_asset(&mut self, target: &AssetTarget) -> ForgeResult<()> {
        self.package
            .add_asset(target.compiled_id, target.virtual_filename.clone())
    }

    pub(crate) fn mark_compiled(&mut self, target: &AssetTarget) {
        tracing::info!(asset = %target.virtual_filename, "compiled");
        self.compiled_files.push(target.output_file.clone());
    }
}

/// One asset compiler.
pub trait AssetCompiler: Send + Sync {
    /// Asset type name this compiler handles (`Material`, `Texture`, ...).
    fn type_name(&self) -> &'static str;

    fn type_id(&self) -> AssetCompilerTypeId {
        AssetCompilerTypeId::new(self.type_name())
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()>;
}

/// Filenames and ids derived in phase 1.
#[derive(Clone, Debug)]
pub(crate) struct AssetTarget {
    pub compiled_id: StringId,
    /// `<project>/<type>/<category>/<name><extension>`, as stored in the package.
    pub virtual_filename: String,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
}

impl AssetTarget {
    pub(crate) fn derive(
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        extension: &str,
    ) -> ForgeResult<Self> {
        let logical = configuration
            .descriptor
            .metadata()
            .logical_path(input.project_name);
        let virtual_filename = format!("{logical}{extension}");
        Ok(Self {
            compiled_id: compiled_asset_id(&logical),
            output_file: input.output_directory.join(&virtual_filename),
            input_file: configuration.descriptor.input_file()?,
            virtual_filename,
        })
    }
}

impl CompilerInput<'_> {
    /// A missing input file skips the rebuild; it is not an error.
    pub(crate) fn input_missing(&self, target: &AssetTarget) -> bool {
        let missing = !target.input_file.exists();
        if missing {
            tracing::warn!(input = %target.input_file.display(), "input file missing, skipped");
        }
        missing
    }

    /// Phase 2: is `target` stale with respect to its input and `dependencies`?
    pub(crate) fn needs_to_be_compiled(
        &self,
        configuration: &CompilerConfiguration<'_>,
        target: &AssetTarget,
        dependencies: &[&Path],
    ) -> bool {
        if self.input_missing(target) {
            return false;
        }
        let mut sources = Vec::with_capacity(dependencies.len() + 1);
        sources.push(target.input_file.as_path());
        sources.extend_from_slice(dependencies);
        let stale = self.cache.needs_to_be_compiled_with_dependencies(
            configuration.renderer_target,
            configuration.descriptor.path(),
            &sources,
            &target.output_file,
        );
        if !stale && !self.force {
            tracing::debug!(asset = %target.virtual_filename, "up to date");
        }
        stale || self.force
    }
}

/// Compilers keyed by [`AssetCompilerTypeId`].
#[derive(Default)]
pub struct CompilerRegistry {
    compilers: HashMap<AssetCompilerTypeId, Box<dyn AssetCompiler>>,
}

impl CompilerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in compiler. Skeleton animations need an importer and are registered
    /// separately.
    pub fn with_default_compilers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(shader_piece::ShaderPieceCompiler));
        registry.register(Box::new(shader_blueprint::ShaderBlueprintCompiler));
        registry.register(Box::new(material_blueprint::MaterialBlueprintCompiler));
        registry.register(Box::new(material::MaterialCompiler));
        registry.register(Box::new(texture::TextureCompiler));
        registry.register(Box::new(mesh::MeshCompiler::new(Box::new(ObjMeshImporter))));
        registry.register(Box::new(scene::SceneCompiler));
        registry.register(Box::new(compositor::CompositorNodeCompiler));
        registry.register(Box::new(compositor_workspace::CompositorWorkspaceCompiler));
        registry
    }

    /// Register a compiler, replacing any previous one for the same type.
    pub fn register(&mut self, compiler: Box<dyn AssetCompiler>) -> Option<Box<dyn AssetCompiler>> {
        self.compilers.insert(compiler.type_id(), compiler)
    }

    /// Register the skeleton animation compiler around `importer`.
    pub fn register_skeleton_animation_importer(
        &mut self,
        importer: Box<dyn SkeletonAnimationImporter>,
    ) {
        self.register(Box::new(skeleton_animation::SkeletonAnimationCompiler::new(
            importer,
        )));
    }

    /// Compiler for `asset_type`.
    pub fn get(&self, asset_type: &str) -> ForgeResult<&dyn AssetCompiler> {
        self.compilers
            .get(&AssetCompilerTypeId::new(asset_type))
            .map(Box::as_ref)
            .ok_or_else(|| ForgeError::unresolved(format!("asset type '{asset_type}' is unknown")))
    }

    pub fn len(&self) -> usize {
        self.compilers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compilers.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compiler/registry.rs"]
mod tests;
