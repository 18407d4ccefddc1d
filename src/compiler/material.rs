use std::path::Path;

use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::ForgeResult;
use crate::material::definition::{MaterialDefinition, check_sibling_declarations, load_material};
use crate::project::resolver::SourceAssetId;
use crate::resource::format;
use crate::resource::writer::MemoryFile;

pub(crate) struct MaterialCompiler;

/// `{materialBlueprintAssetId, numberOfProperties}` followed by the sorted properties.
pub(crate) fn write_material(definition: &MaterialDefinition) -> MemoryFile {
    let mut file = MemoryFile::new();
    file.write_id(definition.blueprint_compiled_id);
    file.write_u32(definition.properties.len() as u32);
    for p in &definition.properties {
        file.write(p);
    }
    file
}

impl AssetCompiler for MaterialCompiler {
    fn type_name(&self) -> &'static str {
        "Material"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".material")?;
        if input.input_missing(&target) {
            return output.add_asset(&target);
        }
        let source_id = SourceAssetId(configuration.descriptor.metadata().asset_id);
        let definition = load_material(input.resolver, source_id)?;
        check_sibling_declarations(input.resolver, source_id, &definition)?;

        let dependencies: Vec<&Path> = definition
            .source_files
            .iter()
            .map(|p| p.as_path())
            .filter(|p| *p != target.input_file && *p != configuration.descriptor.path())
            .collect();
        if input.needs_to_be_compiled(configuration, &target, &dependencies) {
            write_material(&definition).finalize_as(format::MATERIAL, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}
