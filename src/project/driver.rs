//! Project driver: load the project, resolve identities, compile assets into a package.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cache::manager::BuildCache;
use crate::compiler::{CompilerConfiguration, CompilerInput, CompilerOutput, CompilerRegistry};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::project::descriptor::AssetDescriptor;
use crate::project::manifest::{ProjectManifest, Targets, load_assets_table};
use crate::project::resolver::{AssetIdentityResolver, SourceAssetId};
use crate::resource::package::AssetPackage;

/// Knobs for one project build.
#[derive(Clone, Debug, Default)]
pub struct ProjectOptions {
    /// Root of the compiled trees; defaults to `<project dir>/output`. Each renderer target
    /// compiles into its own `<output>/<target>` subdirectory.
    pub output_directory: Option<PathBuf>,
    /// Where the build cache table lives; defaults to `<project dir>/cache`.
    pub cache_directory: Option<PathBuf>,
    /// Rebuild every asset regardless of the cache.
    pub force: bool,
}

/// One asset that could not be compiled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetFailure {
    pub source_id: SourceAssetId,
    pub message: String,
}

/// Outcome of [`Project::compile_all`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Assets whose output was rebuilt.
    pub compiled: usize,
    /// Assets whose output was already current.
    pub skipped: usize,
    pub failures: Vec<AssetFailure>,
}

impl CompileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A loaded project bound to one renderer target.
pub struct Project {
    name: String,
    renderer_target: String,
    output_directory: PathBuf,
    force: bool,
    targets: Targets,
    resolver: AssetIdentityResolver,
    descriptors: BTreeMap<SourceAssetId, AssetDescriptor>,
    load_errors: BTreeMap<SourceAssetId, ForgeError>,
    registry: CompilerRegistry,
    cache: BuildCache,
    package: AssetPackage,
}

impl Project {
    /// Read the project manifest, its assets and targets tables, and every descriptor.
    ///
    /// Descriptors that fail to load are reported by [`Project::compile_all`]; the rest of
    /// the project still loads.
    #[tracing::instrument(skip(options), fields(project = %project_file.display()))]
    pub fn load(
        project_file: &Path,
        renderer_target: &str,
        options: ProjectOptions,
    ) -> ForgeResult<Self> {
        let project_file = std::path::absolute(project_file)
            .with_context(|| format!("resolve '{}'", project_file.display()))?;
        let directory = project_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let manifest = ProjectManifest::load(&project_file)?;
        let name = manifest.project.project_metadata.name;
        let assets = load_assets_table(&directory.join(&manifest.project.assets_filename))?;
        let targets = Targets::load(&directory.join(&manifest.project.targets_filename))?;
        targets.renderer_target(renderer_target)?;

        let mut resolver = AssetIdentityResolver::new(name.clone());
        let mut descriptors = BTreeMap::new();
        let mut load_errors = BTreeMap::new();
        for (id, filename) in assets {
            let source_id = SourceAssetId(id);
            let path = directory.join(&filename);
            let loaded = AssetDescriptor::load(&path).and_then(|descriptor| {
                resolver.insert(source_id, path.clone(), descriptor.metadata().clone())?;
                Ok(descriptor)
            });
            match loaded {
                Ok(descriptor) => {
                    descriptors.insert(source_id, descriptor);
                }
                Err(e) => {
                    let e = e.in_asset(&path);
                    tracing::warn!(asset = %source_id, "{e}");
                    load_errors.insert(source_id, e);
                }
            }
        }
        tracing::info!(assets = descriptors.len(), "project loaded");

        let cache_directory = options
            .cache_directory
            .unwrap_or_else(|| directory.join("cache"));
        let output_directory = options
            .output_directory
            .unwrap_or_else(|| directory.join("output"))
            .join(renderer_target);
        Ok(Self {
            cache: BuildCache::open(&cache_directory, &name),
            name,
            renderer_target: renderer_target.to_string(),
            output_directory,
            force: options.force,
            targets,
            resolver,
            descriptors,
            load_errors,
            registry: CompilerRegistry::with_default_compilers(),
            package: AssetPackage::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolver(&self) -> &AssetIdentityResolver {
        &self.resolver
    }

    /// Register extra compilers (e.g. a skeleton animation importer) before compiling.
    pub fn registry_mut(&mut self) -> &mut CompilerRegistry {
        &mut self.registry
    }

    /// Package assembled by the last compile.
    pub fn package(&self) -> &AssetPackage {
        &self.package
    }

    /// `<output>/<target>/<Project>.assets`.
    pub fn package_path(&self) -> PathBuf {
        self.output_directory.join(format!("{}.assets", self.name))
    }

    fn compile_descriptor(
        &self,
        source_id: SourceAssetId,
        descriptor: &AssetDescriptor,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let metadata = descriptor.metadata();
        if metadata.asset_id != source_id.0 {
            return Err(ForgeError::malformed(format!(
                "descriptor declares AssetId {} but is listed as {source_id}",
                metadata.asset_id
            ))
            .in_asset(descriptor.path()));
        }
        let compiler = self
            .registry
            .get(&metadata.asset_type)
            .map_err(|e| e.in_asset(descriptor.path()))?;
        let input = CompilerInput {
            project_name: &self.name,
            input_directory: descriptor.directory(),
            output_directory: &self.output_directory,
            resolver: &self.resolver,
            cache: &self.cache,
            force: self.force,
        };
        let configuration = CompilerConfiguration {
            descriptor,
            targets: &self.targets,
            renderer_target: &self.renderer_target,
        };
        compiler
            .compile(&input, &configuration, output)
            .map_err(|e| e.in_asset(descriptor.path()))
    }

    /// Compile every asset. A failing asset is logged and reported; the others continue
    /// and the package is written at the end.
    #[tracing::instrument(skip(self), fields(project = %self.name, target = %self.renderer_target))]
    pub fn compile_all(&mut self) -> ForgeResult<CompileReport> {
        let mut report = CompileReport {
            failures: self
                .load_errors
                .iter()
                .map(|(source_id, e)| AssetFailure {
                    source_id: *source_id,
                    message: e.to_string(),
                })
                .collect(),
            ..CompileReport::default()
        };
        let mut package = AssetPackage::new();
        for (source_id, descriptor) in &self.descriptors {
            self.cache.begin_asset();
            let mut output = CompilerOutput::new(&mut package);
            match self.compile_descriptor(*source_id, descriptor, &mut output) {
                Ok(()) if output.compiled_files.is_empty() => report.skipped += 1,
                Ok(()) => report.compiled += 1,
                Err(e) => {
                    self.cache.invalidate_touched();
                    tracing::warn!(asset = %source_id, "{e}");
                    report.failures.push(AssetFailure {
                        source_id: *source_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        package.write_to_file(&self.package_path())?;
        self.cache.save();
        self.package = package;
        tracing::info!(
            compiled = report.compiled,
            skipped = report.skipped,
            failed = report.failures.len(),
            "project compiled"
        );
        Ok(report)
    }

    /// Compile one asset and fold it into the package on disk. Any failure is returned.
    ///
    /// Returns `true` when the output was rebuilt.
    #[tracing::instrument(skip(self), fields(project = %self.name))]
    pub fn compile_asset(&mut self, source_id: SourceAssetId) -> ForgeResult<bool> {
        if let Some(e) = self.load_errors.get(&source_id) {
            return Err(e.duplicate());
        }
        let descriptor = self.descriptors.get(&source_id).ok_or_else(|| {
            ForgeError::unresolved(format!("source asset ID {source_id} is unknown"))
        })?;

        let package_path = self.package_path();
        let mut package = if package_path.exists() {
            AssetPackage::read_from_file(&package_path)?
        } else {
            AssetPackage::new()
        };
        self.cache.begin_asset();
        let mut output = CompilerOutput::new(&mut package);
        if let Err(e) = self.compile_descriptor(source_id, descriptor, &mut output) {
            self.cache.invalidate_touched();
            self.cache.save();
            return Err(e);
        }
        let rebuilt = !output.compiled_files.is_empty();

        package.write_to_file(&package_path)?;
        self.cache.save();
        self.package = package;
        Ok(rebuilt)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/driver.rs"]
mod tests;
