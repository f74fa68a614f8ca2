use ::ash::vk;

use super::AllocatorError;

/// The memory type chosen for a request along with the physical heap which
/// backs it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemorySection {
    pub memory_type_index: u32,
    pub heap_index: u32,
}

/// Find the first memory type which is compatible with the requirements and
/// supports every requested property flag.
///
/// Memory types are scanned in the order reported by the device. Vulkan
/// orders them so that earlier types are generally the better choice.
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    memory_requirements: vk::MemoryRequirements,
    property_flags: vk::MemoryPropertyFlags,
) -> Result<MemorySection, AllocatorError> {
    let count = (memory_properties.memory_type_count as usize)
        .min(memory_properties.memory_types.len());
    memory_properties.memory_types[..count]
        .iter()
        .enumerate()
        .find(|(i, _memory_type)| {
            supports(
                memory_properties,
                *i as u32,
                memory_requirements,
                property_flags,
            )
        })
        .map(|(i, memory_type)| MemorySection {
            memory_type_index: i as u32,
            heap_index: memory_type.heap_index,
        })
        .ok_or_else(|| {
            AllocatorError::NoSuitableMemoryType(
                property_flags,
                memory_requirements,
            )
        })
}

/// True when the memory type at `memory_type_index` is allowed by the
/// requirements and has every requested property flag.
pub fn supports(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    memory_type_index: u32,
    memory_requirements: vk::MemoryRequirements,
    property_flags: vk::MemoryPropertyFlags,
) -> bool {
    let Some(memory_type) = memory_properties
        .memory_types
        .get(memory_type_index as usize)
    else {
        return false;
    };
    let type_supported =
        memory_requirements.memory_type_bits & (1 << memory_type_index) != 0;
    let properties_supported =
        memory_type.property_flags.contains(property_flags);
    type_supported & properties_supported
}
