//! Offline asset pipeline for a real-time renderer.
//!
//! A project lists assets by numeric source id; each asset has a JSON descriptor naming
//! its type and input file. The pipeline:
//!
//! - Loads a [`Project`] and resolves every source id to a stable compiled id
//! - Runs the registered compiler for each asset type, skipping outputs the [`BuildCache`]
//!   reports as current
//! - Writes compressed binary resources plus an [`AssetPackage`] index
#![forbid(unsafe_code)]

mod cache;
mod foundation;

pub mod compiler;
pub mod material;
pub mod project;
pub mod resource;

pub use crate::cache::manager::{BuildCache, FileState};
pub use crate::cache::store::CacheEntry;
pub use crate::foundation::error::{ForgeError, ForgeResult};
pub use crate::foundation::hash::StringId;
pub use crate::project::driver::{AssetFailure, CompileReport, Project, ProjectOptions};
pub use crate::project::resolver::{AssetIdentityResolver, SourceAssetId};
pub use crate::resource::package::{Asset, AssetPackage};
pub use crate::resource::reader::{
    BinaryReader, LoadedResource, decode_resource, load_expected, load_format, load_resource,
};
pub use crate::resource::writer::{BinaryWrite, FileFormatHeader, MemoryFile};

pub use crate::compiler::{
    AssetCompiler, AssetCompilerTypeId, CompilerConfiguration, CompilerInput, CompilerOutput,
    CompilerRegistry,
};
pub use crate::material::property::{
    MaterialProperty, MaterialPropertyValue, PropertyValue, SortedPropertyVector, Usage,
    ValueType,
};

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
mod test_support;
