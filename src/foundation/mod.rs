pub(crate) mod error;
pub(crate) mod hash;
pub(crate) mod json;
