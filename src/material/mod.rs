//! Material and shader property engine: typed property lists, `@name` references,
//! shader-combination bookkeeping and uniform-buffer layout.

pub(crate) mod definition;
pub mod property;
pub(crate) mod reader;
pub mod shader_properties;
pub(crate) mod uniform_buffer;
