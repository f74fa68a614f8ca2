use crate::vulkan::ResourceMemory;

use ash::vk;

/// A Vulkan image and the region of device memory bound to it.
///
/// Images are created and destroyed by the
/// [crate::vulkan::DeviceAllocator] which owns their memory.
pub struct Image {
    /// The Vulkan image handle.
    pub raw: vk::Image,

    /// The region bound to this image. None once the image is destroyed.
    pub(crate) memory: Option<ResourceMemory>,
}

impl Image {
    pub fn memory(&self) -> Option<&ResourceMemory> {
        self.memory.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.raw == vk::Image::null()
    }
}
