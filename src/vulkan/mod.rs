//! Vulkan device memory management.

mod buffer;
mod device_allocator;
mod image;
mod render_device;

pub use self::{
    buffer::Buffer,
    device_allocator::{
        find_memory_type, AllocatorError, DeviceAllocator,
        DeviceAllocatorConfig, HeapInfo, MemoryDevice, MemorySection,
        ResourceLeak, ResourceMemory, DEFAULT_BLOCK_SIZE,
    },
    image::Image,
    render_device::RenderDevice,
};
