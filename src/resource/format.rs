use crate::foundation::hash::StringId;

/// Type tag and version of a compiled binary resource.
///
/// The type tag is the FNV-1a 32 hash of `name`; runtimes match on `(type_id, version)` and
/// must refuse anything they do not know.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceFormat {
    /// Human readable format name, hashed into the header type tag.
    pub name: &'static str,
    /// Format version written into the header.
    pub version: u32,
}

impl ResourceFormat {
    /// Header type tag for this format.
    pub const fn type_id(self) -> StringId {
        StringId::new(self.name)
    }
}

/// Compiled output asset package index.
pub const ASSET_PACKAGE: ResourceFormat = ResourceFormat {
    name: "AssetPackage",
    version: 1,
};
/// Compiled material.
pub const MATERIAL: ResourceFormat = ResourceFormat {
    name: "MaterialAsset",
    version: 1,
};
/// Compiled material blueprint.
pub const MATERIAL_BLUEPRINT: ResourceFormat = ResourceFormat {
    name: "MaterialBlueprintAsset",
    version: 1,
};
/// Compiled mesh.
pub const MESH: ResourceFormat = ResourceFormat {
    name: "MeshAsset",
    version: 1,
};
/// Compiled shader piece.
pub const SHADER_PIECE: ResourceFormat = ResourceFormat {
    name: "ShaderPieceAsset",
    version: 1,
};
/// Compiled shader blueprint.
pub const SHADER_BLUEPRINT: ResourceFormat = ResourceFormat {
    name: "ShaderBlueprintAsset",
    version: 1,
};
/// Compiled compositor node.
pub const COMPOSITOR_NODE: ResourceFormat = ResourceFormat {
    name: "CompositorNodeAsset",
    version: 1,
};
/// Compiled compositor workspace.
pub const COMPOSITOR_WORKSPACE: ResourceFormat = ResourceFormat {
    name: "CompositorWorkspaceAsset",
    version: 1,
};
/// Compiled scene.
pub const SCENE: ResourceFormat = ResourceFormat {
    name: "SceneAsset",
    version: 1,
};
/// Compiled skeleton animation.
pub const SKELETON_ANIMATION: ResourceFormat = ResourceFormat {
    name: "SkeletonAnimationAsset",
    version: 1,
};
/// Compiled texture.
pub const TEXTURE: ResourceFormat = ResourceFormat {
    name: "TextureAsset",
    version: 1,
};
