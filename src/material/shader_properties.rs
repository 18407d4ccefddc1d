use std::collections::BTreeMap;

use crate::foundation::hash::StringId;
use crate::resource::writer::{BinaryWrite, MemoryFile};

/// Hash of a shader property name.
pub type ShaderPropertyId = StringId;

/// Visual importance that forces a shader combination property to always be honored.
pub const MANDATORY_SHADER_PROPERTY: i32 = i32::MAX;

/// Sparse `shader property id -> i32` map, serialized ordered by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderProperties {
    values: BTreeMap<ShaderPropertyId, i32>,
}

impl ShaderProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ShaderPropertyId) -> Option<i32> {
        self.values.get(&id).copied()
    }

    /// Value of `id`, or `default` when unset.
    pub fn get_or(&self, id: ShaderPropertyId, default: i32) -> i32 {
        self.get(id).unwrap_or(default)
    }

    pub fn set(&mut self, id: ShaderPropertyId, value: i32) {
        self.values.insert(id, value);
    }

    /// Return the current value (0 when unset) and store it plus one.
    pub fn post_increment(&mut self, id: ShaderPropertyId) -> i32 {
        let slot = self.values.entry(id).or_insert(0);
        let current = *slot;
        *slot = current.saturating_add(1);
        current
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShaderPropertyId, i32)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// `{count: u32}` followed by `{id: u32, value: i32}` pairs.
impl BinaryWrite for ShaderProperties {
    fn write_to(&self, out: &mut MemoryFile) {
        out.write_u32(self.values.len() as u32);
        for (id, value) in self.iter() {
            out.write_id(id);
            out.write_i32(value);
        }
    }
}
