//! Persistent, content-addressed build cache keyed by `(buildTarget, fileId)`.

pub(crate) mod hasher;
pub(crate) mod manager;
pub(crate) mod store;
