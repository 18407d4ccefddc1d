//! Compiled binary resource files: the append buffer compilers serialize into, the
//! compressed header-prefixed file format, and the output asset package index.

pub mod format;
pub(crate) mod package;
pub(crate) mod reader;
pub(crate) mod writer;
