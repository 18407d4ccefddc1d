use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::json::{check_format, mandatory, read_json};
use crate::project::resolver::SourceAssetId;
use crate::resource::format;
use crate::resource::writer::MemoryFile;

/// Ordered list of compositor nodes.
pub(crate) struct CompositorWorkspaceCompiler;

impl AssetCompiler for CompositorWorkspaceCompiler {
    fn type_name(&self) -> &'static str {
        "CompositorWorkspace"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".compositor_workspace")?;
        if input.needs_to_be_compiled(configuration, &target, &[]) {
            let doc = read_json(&target.input_file)?;
            check_format(
                &doc,
                format::COMPOSITOR_WORKSPACE.name,
                format::COMPOSITOR_WORKSPACE.version,
            )?;
            let body = mandatory(&doc, format::COMPOSITOR_WORKSPACE.name, "document")?;
            let nodes = mandatory(body, "Nodes", "compositor workspace")?
                .as_array()
                .ok_or_else(|| ForgeError::malformed("compositor workspace 'Nodes' must be an array"))?;

            let mut file = MemoryFile::new();
            file.write_u32(nodes.len() as u32);
            for node in nodes {
                let source_id = SourceAssetId::from_json(node, "Nodes")?;
                let asset = input.resolver.asset(source_id)?;
                if asset.metadata.asset_type != "CompositorNode" {
                    return Err(ForgeError::malformed(format!(
                        "workspace node {source_id} is a {}, expected a CompositorNode",
                        asset.metadata.asset_type
                    )));
                }
                file.write_id(asset.compiled_id);
            }
            file.finalize_as(format::COMPOSITOR_WORKSPACE, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}
