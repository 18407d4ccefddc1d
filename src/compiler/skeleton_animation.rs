use std::path::Path;

use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::ForgeResult;
use crate::resource::format;
use crate::resource::writer::MemoryFile;

/// Channel data produced by a [`SkeletonAnimationImporter`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedSkeletonAnimation {
    pub number_of_channels: u32,
    pub duration_in_ticks: f32,
    pub ticks_per_second: f32,
    /// Packed per-channel key frames, opaque to the pipeline.
    pub channel_bytes: Vec<u8>,
}

/// Reads an animation source file; no importer ships with the crate.
pub trait SkeletonAnimationImporter: Send + Sync {
    fn import(&self, path: &Path) -> ForgeResult<ImportedSkeletonAnimation>;
}

pub(crate) struct SkeletonAnimationCompiler {
    importer: Box<dyn SkeletonAnimationImporter>,
}

impl SkeletonAnimationCompiler {
    pub(crate) fn new(importer: Box<dyn SkeletonAnimationImporter>) -> Self {
        Self { importer }
    }
}

impl AssetCompiler for SkeletonAnimationCompiler {
    fn type_name(&self) -> &'static str {
        "SkeletonAnimation"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".skeleton_animation")?;
        if input.needs_to_be_compiled(configuration, &target, &[]) {
            let animation = self.importer.import(&target.input_file)?;
            let mut file = MemoryFile::new();
            file.write_u32(animation.number_of_channels);
            file.write_f32(animation.duration_in_ticks);
            file.write_f32(animation.ticks_per_second);
            file.write_u32(animation.channel_bytes.len() as u32);
            file.write_bytes(&animation.channel_bytes);
            file.finalize_as(format::SKELETON_ANIMATION, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}
