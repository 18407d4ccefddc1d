use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::ForgeResult;
use crate::foundation::json::{check_format, read_json};
use crate::material::definition::{BlueprintDefinition, parse_blueprint};
use crate::resource::format;
use crate::resource::writer::MemoryFile;

pub(crate) struct MaterialBlueprintCompiler;

/// Header, sorted properties, the two shader property maps, then the uniform buffers.
pub(crate) fn write_blueprint(definition: &BlueprintDefinition) -> MemoryFile {
    let mut file = MemoryFile::new();
    file.write_u32(definition.properties.len() as u32);
    file.write_u32(definition.number_of_shader_combination_properties() as u32);
    file.write_u32(definition.uniform_buffers.len() as u32);
    file.write_id(definition.vertex_shader_blueprint);
    file.write_id(definition.fragment_shader_blueprint);
    for p in &definition.properties {
        file.write(p);
    }
    file.write(&definition.visual_importance);
    file.write(&definition.maximum_integer_value);
    for buffer in &definition.uniform_buffers {
        file.write(buffer);
    }
    file
}

impl AssetCompiler for MaterialBlueprintCompiler {
    fn type_name(&self) -> &'static str {
        "MaterialBlueprint"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".material_blueprint")?;
        if input.needs_to_be_compiled(configuration, &target, &[]) {
            let doc = read_json(&target.input_file)?;
            check_format(&doc, format::MATERIAL_BLUEPRINT.name, format::MATERIAL_BLUEPRINT.version)?;
            let logical = configuration
                .descriptor
                .metadata()
                .logical_path(input.project_name);
            let definition = parse_blueprint(&doc, input.resolver, target.compiled_id, &logical)?;
            write_blueprint(&definition).finalize_as(format::MATERIAL_BLUEPRINT, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}
