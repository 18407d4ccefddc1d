use anyhow::Context;

use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::foundation::json::optional_bool;
use crate::resource::format;
use crate::resource::writer::MemoryFile;

/// Block-compressed container formats; their blocks cover 4x4 texels.
const BLOCK_COMPRESSED_FORMATS: &[&str] = &["crn", "dds", "ktx"];

pub(crate) struct TextureCompiler;

/// Reject dimensions a 4x4 block codec cannot encode, unless explicitly allowed.
pub(crate) fn check_dimensions(
    file_format: &str,
    width: u32,
    height: u32,
    allow_non_multiple_of_four: bool,
) -> ForgeResult<()> {
    let block_compressed = BLOCK_COMPRESSED_FORMATS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(file_format));
    if block_compressed && !allow_non_multiple_of_four && (width % 4 != 0 || height % 4 != 0) {
        return Err(ForgeError::policy(format!(
            "texture is {width}x{height} but '{file_format}' needs dimensions that are multiples \
             of four, set AllowNonMultipleOfFourDimensions to override"
        )));
    }
    Ok(())
}

impl AssetCompiler for TextureCompiler {
    fn type_name(&self) -> &'static str {
        "Texture"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".texture")?;
        let dependencies: Vec<_> = configuration.targets.path().into_iter().collect();
        if input.needs_to_be_compiled(configuration, &target, &dependencies) {
            let options = configuration.descriptor.compiler_options()?;
            let allow = optional_bool(options, "AllowNonMultipleOfFourDimensions", "TextureAssetCompiler")?
                .unwrap_or(false);
            let file_format = &configuration
                .targets
                .texture_target_for(configuration.renderer_target)?
                .file_format;

            let (width, height) = image::image_dimensions(&target.input_file).map_err(|e| {
                ForgeError::malformed(format!(
                    "cannot read texture '{}': {e}",
                    target.input_file.display()
                ))
            })?;
            check_dimensions(file_format, width, height, allow)?;

            let bytes = std::fs::read(&target.input_file)
                .with_context(|| format!("read texture '{}'", target.input_file.display()))?;
            let mut file = MemoryFile::new();
            file.write_u32(width);
            file.write_u32(height);
            file.write_id(StringId::new(file_format));
            file.write_u32(bytes.len() as u32);
            file.write_bytes(&bytes);
            file.finalize_as(format::TEXTURE, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compiler/texture.rs"]
mod tests;
