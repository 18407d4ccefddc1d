//! Project configuration, identity resolution and the compile driver.

pub mod descriptor;
pub(crate) mod driver;
pub mod manifest;
pub mod resolver;
