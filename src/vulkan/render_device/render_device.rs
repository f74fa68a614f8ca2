use super::RenderDevice;

use crate::vulkan::MemoryDevice;

use ash::vk;

impl RenderDevice {
    /// Wrap an existing logical device.
    ///
    /// # Safety
    ///
    /// - the logical device must have been created from `physical_device`
    /// - `physical_device` must have been enumerated from `instance`
    pub unsafe fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        logical_device: ash::Device,
    ) -> Self {
        let memory_properties =
            instance.get_physical_device_memory_properties(physical_device);
        Self {
            logical_device,
            memory_properties,
        }
    }

    /// The logical device used for creating and binding resources.
    pub fn logical_device(&self) -> &ash::Device {
        &self.logical_device
    }
}

impl MemoryDevice for RenderDevice {
    fn memory_properties(&self) -> vk::PhysicalDeviceMemoryProperties {
        self.memory_properties
    }

    /// Directly allocate device memory onto the heap indicated by the
    /// memory type index of the `allocate_info` struct.
    unsafe fn allocate_block(
        &self,
        allocate_info: &vk::MemoryAllocateInfo<'_>,
    ) -> Result<vk::DeviceMemory, vk::Result> {
        // Memory allocated by the logical device is always aligned to the
        // strictest alignment this system can require, so offset 0 in a
        // block is valid for any resource. See the notes here:
        // https://www.khronos.org/registry/vulkan/specs/1.2-extensions/man/html/vkAllocateMemory.html
        self.logical_device.allocate_memory(allocate_info, None)
    }

    unsafe fn free_block(&self, memory: vk::DeviceMemory) {
        self.logical_device.free_memory(memory, None);
    }
}
