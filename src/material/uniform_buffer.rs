use serde_json::{Map, Value};

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::hash::StringId;
use crate::material::property::{MaterialProperty, MaterialPropertyValue, SortedPropertyVector};
use crate::material::reader::{PropertyReader, counter_name, value_text};
use crate::resource::writer::{BinaryWrite, MemoryFile};

/// Size of one shading-language register package.
pub const PACKAGE_BYTES: u32 = 16;

/// What the runtime fills a uniform buffer from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BufferUsage {
    Unknown,
    Material,
    Instance,
    Pass,
}

impl BufferUsage {
    pub fn parse(s: &str) -> ForgeResult<Self> {
        match s {
            "UNKNOWN" => Ok(Self::Unknown),
            "MATERIAL" => Ok(Self::Material),
            "INSTANCE" => Ok(Self::Instance),
            "PASS" => Ok(Self::Pass),
            other => Err(ForgeError::malformed(format!("unknown BufferUsage '{other}'"))),
        }
    }
}

/// One uniform buffer declared by a material blueprint.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformBuffer {
    pub name: StringId,
    pub usage: BufferUsage,
    pub number_of_elements: u32,
    pub number_of_bytes_per_element: u32,
    /// Element properties in declaration order; the order is the memory layout.
    pub element_properties: Vec<MaterialProperty>,
}

impl UniformBuffer {
    /// Bytes the runtime allocates for the whole buffer.
    pub fn total_number_of_bytes(&self) -> u64 {
        u64::from(self.number_of_elements) * u64::from(self.number_of_bytes_per_element)
    }
}

impl BinaryWrite for UniformBuffer {
    fn write_to(&self, out: &mut MemoryFile) {
        out.write_id(self.name);
        out.write_u32(self.usage as u32);
        out.write_u32(self.number_of_elements);
        out.write_u32(self.number_of_bytes_per_element);
        out.write_u32(self.element_properties.len() as u32);
        for p in &self.element_properties {
            out.write(p);
        }
    }
}

/// Bytes one element occupies, walking the properties in declaration order.
///
/// A property that would overflow the current 16-byte package starts the next one. A
/// property that fits but sits at an offset not divisible by its own size is an error.
pub fn number_of_bytes_per_element(properties: &[MaterialProperty]) -> ForgeResult<u32> {
    let mut bytes = 0u32;
    let mut package = 0u32;
    for p in properties {
        let size = p.value_type().uniform_number_of_bytes();
        if size == 0 {
            return Err(ForgeError::malformed(format!(
                "element property {} of value type {} cannot be stored in a uniform buffer",
                p.id,
                p.value_type()
            )));
        }

        if package != 0 && package + size > PACKAGE_BYTES {
            bytes += PACKAGE_BYTES - package;
            package = 0;
        } else if package != 0 && package % size != 0 {
            let aligned = package.next_multiple_of(size);
            let needed = if aligned + size > PACKAGE_BYTES {
                PACKAGE_BYTES
            } else {
                aligned
            };
            return Err(ForgeError::malformed(format!(
                "element property alignment is problematic at offset {bytes}, would need offset {}",
                bytes - package + needed
            )));
        }

        bytes += size;
        package = (package + size) % PACKAGE_BYTES;
    }
    Ok(bytes)
}

fn number_of_elements(
    value: &Value,
    reader: &mut PropertyReader<'_>,
    blueprint: &SortedPropertyVector,
    ctx: &str,
) -> ForgeResult<u32> {
    let text = value_text(value, ctx)?;
    let n: i64 = if let Some(counter) = counter_name(&text) {
        i64::from(reader.next_counter(counter))
    } else if let Some(name) = text.strip_prefix('@') {
        let p = blueprint.find(StringId::new(name)).ok_or_else(|| {
            ForgeError::unresolved(format!("{ctx}: NumberOfElements property '@{name}' is unknown"))
        })?;
        match p.literal_value() {
            Some(MaterialPropertyValue::Integer(v)) => i64::from(v),
            _ => {
                return Err(ForgeError::type_mismatch(format!(
                    "{ctx}: NumberOfElements property '@{name}' must be an INTEGER literal"
                )));
            }
        }
    } else {
        text.trim().parse().map_err(|_| {
            ForgeError::malformed(format!("{ctx}: invalid NumberOfElements '{text}'"))
        })?
    };
    u32::try_from(n)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ForgeError::malformed(format!("{ctx}: NumberOfElements must be positive")))
}

/// Read the `UniformBuffers` object of a material blueprint.
///
/// Element properties may reference earlier element properties and the blueprint's own
/// properties.
pub fn read_uniform_buffers(
    buffers: &Map<String, Value>,
    reader: &mut PropertyReader<'_>,
    blueprint: &SortedPropertyVector,
) -> ForgeResult<Vec<UniformBuffer>> {
    let mut out = Vec::with_capacity(buffers.len());
    for (name, entry) in buffers {
        let ctx = format!("uniform buffer '{name}'");
        let usage = match entry.get("BufferUsage") {
            Some(v) => BufferUsage::parse(&value_text(v, &ctx)?)?,
            None => BufferUsage::Unknown,
        };
        let count_value = entry.get("NumberOfElements").ok_or_else(|| {
            ForgeError::malformed(format!("{ctx}: missing mandatory 'NumberOfElements'"))
        })?;
        let number_of_elements = number_of_elements(count_value, reader, blueprint, &ctx)?;

        let elements = entry
            .get("ElementProperties")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ForgeError::malformed(format!("{ctx}: 'ElementProperties' must be an object"))
            })?;
        let mut declared = SortedPropertyVector::new();
        let mut element_properties = Vec::with_capacity(elements.len());
        for (element_name, element) in elements {
            let parsed = reader.read_property(element_name, element, &[&declared, blueprint])?;
            declared.insert(parsed.property);
            element_properties.push(parsed.property);
        }

        let number_of_bytes_per_element = number_of_bytes_per_element(&element_properties)?;
        out.push(UniformBuffer {
            name: StringId::new(name),
            usage,
            number_of_elements,
            number_of_bytes_per_element,
            element_properties,
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/material/uniform_buffer.rs"]
mod tests;
