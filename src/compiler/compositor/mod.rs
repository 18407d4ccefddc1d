//! Compositor node compiler.
//!
//! A node document declares, in this order, the channels it connects through, the render
//! target textures and framebuffers it owns, and the targets whose passes render into
//! them. Every name a later section uses must have been declared by an earlier one.
//!
//! Payload: `{numberOfInputChannels, numberOfRenderTargetTextures, numberOfFramebuffers,
//! numberOfTargets, numberOfOutputChannels}`, input channel ids, render target textures,
//! framebuffers, targets with their passes, output channel ids.

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::Value;
use smallvec::SmallVec;

use crate::compiler::{
    AssetCompiler, AssetTarget, CompilerConfiguration, CompilerInput, CompilerOutput,
};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::foundation::json::{
    check_format, mandatory, optional_bool, optional_f32, optional_object, optional_str,
    optional_u32, read_json,
};
use crate::material::reader::BUILT_IN_TEXTURES;
use crate::project::resolver::AssetIdentityResolver;
use crate::resource::format;
use crate::resource::writer::MemoryFile;

pub(crate) mod expand;
pub(crate) mod pass;

use expand::expand_entries;

/// Color attachments one framebuffer can bind.
pub const MAXIMUM_NUMBER_OF_COLOR_TEXTURES: usize = 8;

/// Width or height of a render target texture sized from the viewport.
pub const VIEWPORT_SIZED: u32 = u32::MAX;

/// `TextureFormat` names, serialized by their index.
pub const TEXTURE_FORMATS: [&str; 16] = [
    "R8",
    "R8G8B8",
    "R8G8B8A8",
    "R8G8B8A8_SRGB",
    "B8G8R8A8",
    "R11G11B10F",
    "R16G16B16A16F",
    "R32G32B32A32F",
    "R16_UNORM",
    "R32_UINT",
    "R32_FLOAT",
    "R16G16_SNORM",
    "R16G16_FLOAT",
    "D32_FLOAT",
    "D24_UNORM_S8_UINT",
    "UNKNOWN",
];

pub(crate) const RTT_ALLOW_MULTISAMPLE: u8 = 1 << 0;
pub(crate) const RTT_GENERATE_MIPMAPS: u8 = 1 << 1;
pub(crate) const RTT_ALLOW_RESOLUTION_SCALE: u8 = 1 << 2;

pub(crate) struct CompositorNodeCompiler;

/// Names declared so far in one node document.
#[derive(Debug, Default)]
pub(crate) struct NodeScope {
    channels: HashSet<StringId>,
    textures: HashSet<StringId>,
    framebuffers: HashSet<StringId>,
}

impl NodeScope {
    /// Render target texture or built-in texture named `name`.
    pub(crate) fn texture(&self, name: &str) -> Option<StringId> {
        let id = StringId::new(name);
        (self.textures.contains(&id) || BUILT_IN_TEXTURES.contains(&name)).then_some(id)
    }

    pub(crate) fn texture_reference(&self, name: &str, ctx: &str) -> ForgeResult<StringId> {
        self.texture(name).ok_or_else(|| {
            ForgeError::unresolved(format!("{ctx}: render target texture '{name}' is unknown"))
        })
    }

    /// Declare a texture produced by a pass rather than listed in `RenderTargetTextures`.
    pub(crate) fn declare_texture(&mut self, name: &str, ctx: &str) -> ForgeResult<StringId> {
        let id = StringId::new(name);
        if !self.textures.insert(id) || BUILT_IN_TEXTURES.contains(&name) {
            return Err(ForgeError::malformed(format!(
                "{ctx}: texture '{name}' is already declared"
            )));
        }
        Ok(id)
    }

    pub(crate) fn framebuffer(&self, name: &str, ctx: &str) -> ForgeResult<StringId> {
        let id = StringId::new(name);
        if self.framebuffers.contains(&id) {
            Ok(id)
        } else {
            Err(ForgeError::unresolved(format!("{ctx}: framebuffer '{name}' is unknown")))
        }
    }

    /// A target renders into a channel or a framebuffer.
    fn target(&self, name: &str) -> ForgeResult<StringId> {
        let id = StringId::new(name);
        if self.channels.contains(&id) || self.framebuffers.contains(&id) {
            Ok(id)
        } else {
            Err(ForgeError::unresolved(format!(
                "target '{name}' is neither a channel nor a framebuffer"
            )))
        }
    }
}

/// Parsed `RenderTargetTextures` entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTargetTexture {
    pub id: StringId,
    /// [`VIEWPORT_SIZED`] when sized from the viewport.
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    pub texture_format: u8,
    pub flags: u8,
}

impl RenderTargetTexture {
    pub(crate) fn parse(name: &str, entry: &Value) -> ForgeResult<Self> {
        let ctx = format!("render target texture '{name}'");
        let texture_format = match optional_str(entry, "TextureFormat") {
            None => {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: missing mandatory 'TextureFormat'"
                )));
            }
            Some(f) => TEXTURE_FORMATS.iter().position(|n| *n == f).ok_or_else(|| {
                ForgeError::malformed(format!("{ctx}: unknown TextureFormat '{f}'"))
            })? as u8,
        };

        let width = optional_u32(entry, "Width", &ctx)?;
        let height = optional_u32(entry, "Height", &ctx)?;
        let scale = optional_f32(entry, "Scale", &ctx)?;
        let allow_resolution_scale = optional_bool(entry, "AllowResolutionScale", &ctx)?;
        let (width, height) = match (width, height) {
            (None, None) => (VIEWPORT_SIZED, VIEWPORT_SIZED),
            (Some(w), Some(h)) => {
                if scale.is_some() || allow_resolution_scale == Some(true) {
                    return Err(ForgeError::policy(format!(
                        "{ctx}: a fixed Width/Height cannot be combined with Scale or \
                         AllowResolutionScale"
                    )));
                }
                if w == 0 || h == 0 || w == VIEWPORT_SIZED || h == VIEWPORT_SIZED {
                    return Err(ForgeError::malformed(format!("{ctx}: invalid size {w}x{h}")));
                }
                (w, h)
            }
            _ => {
                return Err(ForgeError::malformed(format!(
                    "{ctx}: Width and Height must be given together"
                )));
            }
        };
        let fixed = width != VIEWPORT_SIZED;
        let scale = scale.unwrap_or(1.0);
        if scale.is_nan() || scale <= 0.0 {
            return Err(ForgeError::malformed(format!("{ctx}: Scale must be positive")));
        }

        let mut flags = 0;
        if optional_bool(entry, "AllowMultisample", &ctx)?.unwrap_or(false) {
            flags |= RTT_ALLOW_MULTISAMPLE;
        }
        if optional_bool(entry, "GenerateMipmaps", &ctx)?.unwrap_or(false) {
            flags |= RTT_GENERATE_MIPMAPS;
        }
        if allow_resolution_scale.unwrap_or(!fixed) {
            flags |= RTT_ALLOW_RESOLUTION_SCALE;
        }
        Ok(Self {
            id: StringId::new(name),
            width,
            height,
            scale,
            texture_format,
            flags,
        })
    }

    fn write_to(&self, file: &mut MemoryFile) {
        file.write_id(self.id);
        file.write_u32(self.width);
        file.write_u32(self.height);
        file.write_f32(self.scale);
        file.write_u8(self.texture_format);
        file.write_u8(self.flags);
        file.write_u16(0);
    }
}

/// Parsed `Framebuffers` entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    pub id: StringId,
    pub color_textures: SmallVec<[StringId; MAXIMUM_NUMBER_OF_COLOR_TEXTURES]>,
    /// `UNINITIALIZED` without a depth stencil attachment.
    pub depth_stencil_texture: StringId,
}

impl Framebuffer {
    fn parse(name: &str, entry: &Value, scope: &NodeScope) -> ForgeResult<Self> {
        let ctx = format!("framebuffer '{name}'");
        let mut color_textures = SmallVec::new();
        match entry.get("ColorTextures") {
            None => {}
            Some(Value::Array(items)) => {
                if items.len() > MAXIMUM_NUMBER_OF_COLOR_TEXTURES {
                    return Err(ForgeError::malformed(format!(
                        "{ctx}: {} color textures, at most {MAXIMUM_NUMBER_OF_COLOR_TEXTURES} \
                         are supported",
                        items.len()
                    )));
                }
                for item in items {
                    let texture = item.as_str().ok_or_else(|| {
                        ForgeError::malformed(format!("{ctx}: ColorTextures must be strings"))
                    })?;
                    color_textures.push(scope.texture_reference(texture, &ctx)?);
                }
            }
            Some(_) => {
                return Err(ForgeError::malformed(format!("{ctx}: ColorTextures must be an array")));
            }
        }
        let depth_stencil_texture = match optional_str(entry, "DepthStencilTexture") {
            Some(texture) => scope.texture_reference(texture, &ctx)?,
            None => StringId::UNINITIALIZED,
        };
        Ok(Self {
            id: StringId::new(name),
            color_textures,
            depth_stencil_texture,
        })
    }

    fn write_to(&self, file: &mut MemoryFile) {
        file.write_id(self.id);
        file.write_u32(self.color_textures.len() as u32);
        for i in 0..MAXIMUM_NUMBER_OF_COLOR_TEXTURES {
            file.write_id(
                self.color_textures
                    .get(i)
                    .copied()
                    .unwrap_or(StringId::UNINITIALIZED),
            );
        }
        file.write_id(self.depth_stencil_texture);
    }
}

fn channel_list(body: &Value, key: &str, scope: &mut NodeScope) -> ForgeResult<Vec<StringId>> {
    let items = match body.get(key) {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ForgeError::malformed(format!("'{key}' must be an array"))),
    };
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let name = item
            .as_str()
            .ok_or_else(|| ForgeError::malformed(format!("'{key}' entries must be strings")))?;
        let id = StringId::new(name);
        if ids.contains(&id) {
            return Err(ForgeError::malformed(format!("{key}: channel '{name}' is listed twice")));
        }
        scope.channels.insert(id);
        ids.push(id);
    }
    Ok(ids)
}

/// Serialize a `CompositorNodeAsset` document; returns the payload and the material files
/// its passes depend on.
pub(crate) fn write_compositor_node(
    doc: &Value,
    resolver: &AssetIdentityResolver,
) -> ForgeResult<(MemoryFile, Vec<PathBuf>)> {
    let body = mandatory(doc, format::COMPOSITOR_NODE.name, "document")?;
    let mut scope = NodeScope::default();
    let input_channels = channel_list(body, "InputChannels", &mut scope)?;
    let output_channels = channel_list(body, "OutputChannels", &mut scope)?;

    let mut render_target_textures = Vec::new();
    if let Some(obj) = optional_object(body, "RenderTargetTextures", "compositor node")? {
        for (name, entry) in expand_entries(obj)? {
            let rtt = RenderTargetTexture::parse(&name, &entry)?;
            scope.declare_texture(&name, "RenderTargetTextures")?;
            render_target_textures.push(rtt);
        }
    }

    let mut framebuffers = Vec::new();
    if let Some(obj) = optional_object(body, "Framebuffers", "compositor node")? {
        for (name, entry) in expand_entries(obj)? {
            let framebuffer = Framebuffer::parse(&name, &entry, &scope)?;
            if !scope.framebuffers.insert(framebuffer.id) {
                return Err(ForgeError::malformed(format!(
                    "framebuffer '{name}' is declared twice"
                )));
            }
            framebuffers.push(framebuffer);
        }
    }

    let mut dependencies = Vec::new();
    let mut targets = MemoryFile::new();
    let mut number_of_targets = 0u32;
    if let Some(obj) = optional_object(body, "Targets", "compositor node")? {
        for (name, passes) in expand_entries(obj)? {
            let target_id = scope.target(&name)?;
            let passes = passes.as_object().ok_or_else(|| {
                ForgeError::malformed(format!("target '{name}': passes must be an object"))
            })?;
            let passes = expand_entries(passes)?;
            targets.write_id(target_id);
            targets.write_u32(passes.len() as u32);
            for (key, pass) in &passes {
                pass::write_pass(&mut targets, key, pass, &mut scope, resolver, &mut dependencies)?;
            }
            number_of_targets += 1;
        }
    }

    let mut file = MemoryFile::new();
    file.write_u32(input_channels.len() as u32);
    file.write_u32(render_target_textures.len() as u32);
    file.write_u32(framebuffers.len() as u32);
    file.write_u32(number_of_targets);
    file.write_u32(output_channels.len() as u32);
    for id in &input_channels {
        file.write_id(*id);
    }
    for rtt in &render_target_textures {
        rtt.write_to(&mut file);
    }
    for framebuffer in &framebuffers {
        framebuffer.write_to(&mut file);
    }
    file.write_bytes(targets.as_bytes());
    for id in &output_channels {
        file.write_id(*id);
    }
    Ok((file, dependencies))
}

impl AssetCompiler for CompositorNodeCompiler {
    fn type_name(&self) -> &'static str {
        "CompositorNode"
    }

    fn compile(
        &self,
        input: &CompilerInput<'_>,
        configuration: &CompilerConfiguration<'_>,
        output: &mut CompilerOutput<'_>,
    ) -> ForgeResult<()> {
        let target = AssetTarget::derive(input, configuration, ".compositor_node")?;
        if input.input_missing(&target) {
            return output.add_asset(&target);
        }
        let doc = read_json(&target.input_file)?;
        check_format(&doc, format::COMPOSITOR_NODE.name, format::COMPOSITOR_NODE.version)?;
        let (file, dependencies) = write_compositor_node(&doc, input.resolver)
            .map_err(|e| e.in_asset(&target.input_file))?;

        let dependencies: Vec<_> = dependencies.iter().map(|p| p.as_path()).collect();
        if input.needs_to_be_compiled(configuration, &target, &dependencies) {
            file.finalize_as(format::COMPOSITOR_NODE, &target.output_file)?;
            output.mark_compiled(&target);
        }
        output.add_asset(&target)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/compiler/compositor/node.rs"]
mod tests;
