use anyhow::Context;

use crate::compiler::shader_piece::{source_code_size, write_source_code};
use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::project::resolver::{AssetIdentityResolver, SourceAssetId};
use crate::resource::format;
use crate::resource::writer::MemoryFile;

const INCLUDE_PIECE: &str = "@includepiece(";
const PROPERTY: &str = "@property(";

/// Shader blueprint source: shader text with `@includepiece(<source id>)` and
/// `@property(<name>)` instructions.
pub(crate) struct ShaderBlueprintCompiler;

/// Arguments of every `<instruction>...)` occurrence, in order.
fn instruction_arguments<'s>(source: &'s str, instruction: &str) -> ForgeResult<Vec<&'s str>> {
    let mut out = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find(instruction) {
        let after = &rest[start + instruction.len()..];
        let end = after.find(')').ok_or_else(|| {
            ForgeError::malformed(format!("unterminated '{instruction}' instruction"))
        })?;
        out.push(after[..end].trim());
        rest = &after[end + 1..];
    }
    Ok(out)
}

/// Compiled piece ids and shader property ids referenced by `source`, deduplicated in
/// order of first use.
pub(crate) fn scan_shader_blueprint(
    source: &str,
    resolver: &AssetIdentityResolver,
) -> ForgeResult<(Vec<StringId>, Vec<StringId>)> {
    let mut pieces = Vec::new();
    for arg in instruction_arguments(source, INCLUDE_PIECE)? {
        let source_id = arg.parse::<u32>().map(SourceAssetId).map_err(|_| {
            ForgeError::malformed(format!("@includepiece argument '{arg}' is not a source asset id"))
        })?;
        let id = resolver.compiled_asset_id(source_id).map_err(|_| {
            ForgeError::unresolved(format!(
                "@includepiece({arg}): source asset ID {source_id} is unknown"
            ))
        })?;
        if !pieces.contains(&id) {
            pieces.push(id);
        }
    }

    let mut properties = Vec::new();
    for arg in instruction_arguments(source, PROPERTY)? {
        let id = StringId::new(arg);
        if !properties.contains(&id) {
            properties.push(id);
        }
    }

    if pieces.len() > usize::from(u16::MAX) || properties.len() > usize::from(u16::MAX) {
        return Err(ForgeError::malformed(
            "shader blueprint references too many pieces or properties",
        ));
    }
    Ok((pieces, properties))
}

impl AssetCompiler for ShaderBlueprintCompiler {
    fn type_name(&self) -> &'static str {
        "ShaderBlueprint"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".shader_blueprint")?;
        if input.needs_to_be_compiled(configuration, &target, &[]) {
            let source = std::fs::read_to_string(&target.input_file).with_context(|| {
                format!("read shader blueprint '{}'", target.input_file.display())
            })?;
            let (pieces, properties) = scan_shader_blueprint(&source, input.resolver)?;

            let mut file = MemoryFile::new();
            write_shader_blueprint(&mut file, &pieces, &properties, &source);
            file.finalize_as(format::SHADER_BLUEPRINT, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}

/// Header `{pieces u16, properties u16, numberOfSourceCodeBytes u32}`, the ids, then the
/// terminated source.
fn write_shader_blueprint(
    file: &mut MemoryFile,
    pieces: &[StringId],
    properties: &[StringId],
    source: &str,
) {
    file.write_u16(pieces.len() as u16);
    file.write_u16(properties.len() as u16);
    file.write_u32(source_code_size(source));
    for id in pieces.iter().chain(properties) {
        file.write_id(*id);
    }
    write_source_code(file, source);
}

#[cfg(test)]
#[path = "../../tests/unit/compiler/shader_blueprint.rs"]
mod tests;
