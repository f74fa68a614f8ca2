mod render_device;

use ash::vk;

/// The device state which the allocator and the resources it backs need:
/// the logical device's function table and the physical device's memory
/// topology.
///
/// The render device does not own the logical device. The application must
/// keep the device alive, and destroy it, after every allocator and resource
/// created from this render device is gone.
pub struct RenderDevice {
    /// The Vulkan logical device used to allocate and bind memory.
    logical_device: ash::Device,

    /// The memory heaps and types of the physical device, queried once.
    memory_properties: vk::PhysicalDeviceMemoryProperties,
}
