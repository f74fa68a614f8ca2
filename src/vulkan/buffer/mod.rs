mod buffer;

use crate::vulkan::ResourceMemory;

use ash::vk;

/// A Vulkan buffer and the region of device memory bound to it.
///
/// Buffers are created and destroyed by the
/// [crate::vulkan::DeviceAllocator] which owns their memory.
pub struct Buffer {
    /// The underlying Vulkan buffer type
    pub raw: vk::Buffer,

    /// The region bound to this buffer. None once the buffer is destroyed.
    pub(crate) memory: Option<ResourceMemory>,

    /// The pointer to the cpu-accessible memory-mapped region of memory for
    /// this buffer. Only valid after a call to map().
    pub(crate) mapped_ptr: Option<*mut std::ffi::c_void>,
}
