use anyhow::Context;

use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::ForgeResult;
use crate::resource::format;
use crate::resource::writer::MemoryFile;

/// Shader source fragment included by shader blueprints.
pub(crate) struct ShaderPieceCompiler;

/// `numberOfSourceCodeBytes` of `source`, NUL terminator included.
pub(crate) fn source_code_size(source: &str) -> u32 {
    source.len() as u32 + 1
}

/// The source followed by a NUL terminator.
pub(crate) fn write_source_code(file: &mut MemoryFile, source: &str) {
    file.write_bytes(source.as_bytes());
    file.write_u8(0);
}

impl AssetCompiler for ShaderPieceCompiler {
    fn type_name(&self) -> &'static str {
        "ShaderPiece"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".shader_piece")?;
        if input.needs_to_be_compiled(configuration, &target, &[]) {
            let source = std::fs::read_to_string(&target.input_file)
                .with_context(|| format!("read shader piece '{}'", target.input_file.display()))?;
            let mut file = MemoryFile::new();
            file.write_u32(source_code_size(&source));
            write_source_code(&mut file, &source);
            file.finalize_as(format::SHADER_PIECE, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}
