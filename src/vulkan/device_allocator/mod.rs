//! This module defines the device (gpu) memory sub-allocator.
//!
//! Large fixed-size blocks are requested from the device on demand and then
//! carved into power-of-two sized regions which are handed out to buffers and
//! images. Blocks live until the allocator is dropped.

mod allocation;
mod device_allocator;
mod heap;
mod memory_type;
mod resource_allocator;

use ::{ash::vk, std::fmt, std::sync::Arc, thiserror::Error};

pub use self::{
    allocation::{Allocation, OwnedMemory},
    heap::{Heap, HeapInfo},
    memory_type::{find_memory_type, MemorySection},
};

/// The size of every block requested from the device: 256MB.
pub const DEFAULT_BLOCK_SIZE: vk::DeviceSize = 268_435_456;

#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error(
        "Requested {} bytes but no sub-allocation can be larger than the {} byte block size",
        .requested,
        .block_size
    )]
    AllocationTooLarge {
        requested: vk::DeviceSize,
        block_size: vk::DeviceSize,
    },

    #[error("no memory type could be found for flags {:?} and requirements {:?}", .0, .1)]
    NoSuitableMemoryType(vk::MemoryPropertyFlags, vk::MemoryRequirements),

    #[error(
        "Unable to allocate a {} byte block from heap {}",
        .block_size,
        .heap_index
    )]
    OutOfMemory {
        heap_index: u32,
        block_size: vk::DeviceSize,
        source: vk::Result,
    },

    #[error(
        "Tried to free unknown resource at offset {} in heap {}",
        .offset,
        .heap_index
    )]
    UnknownResource {
        heap_index: u32,
        offset: vk::DeviceSize,
    },

    #[error("The block size must be a non-zero power of two, got {}", .0)]
    InvalidBlockSize(vk::DeviceSize),

    #[error(
        "Unable to create a new device buffer for {} bytes with flags {:?}",
        .size,
        .usage
    )]
    UnableToCreateBuffer {
        size: u64,
        usage: vk::BufferUsageFlags,
        source: vk::Result,
    },

    #[error("Unable to create a new device image")]
    UnableToCreateImage(#[source] vk::Result),

    #[error("Unable to bind device memory")]
    UnableToBindDeviceMemory(#[source] vk::Result),

    #[error("Unable to map device memory")]
    UnableToMapMemory(#[source] vk::Result),
}

/// The device capabilities the allocator depends on.
///
/// This is implemented by [crate::vulkan::RenderDevice] for real hardware.
pub trait MemoryDevice {
    /// The memory heaps and memory types reported by the physical device.
    fn memory_properties(&self) -> vk::PhysicalDeviceMemoryProperties;

    /// Allocate a single piece of device memory.
    ///
    /// # Safety
    ///
    /// - it is the responsibility of the caller to free the returned memory
    ///   with `free_block` when it is no longer in use
    /// - the memory type index in allocate_info is assumed to be valid for
    ///   this device
    unsafe fn allocate_block(
        &self,
        allocate_info: &vk::MemoryAllocateInfo<'_>,
    ) -> Result<vk::DeviceMemory, vk::Result>;

    /// Free a piece of device memory returned by `allocate_block`.
    ///
    /// # Safety
    ///
    /// - the memory must not be in use by the GPU
    /// - the memory must not be freed more than once
    unsafe fn free_block(&self, memory: vk::DeviceMemory);
}

/// Tunable parameters for the allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceAllocatorConfig {
    /// The size, in bytes, of every block requested from the device. This is
    /// also the largest request the allocator can satisfy.
    pub block_size: vk::DeviceSize,
}

impl Default for DeviceAllocatorConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl DeviceAllocatorConfig {
    pub fn with_block_size(self, block_size: vk::DeviceSize) -> Self {
        Self { block_size }
    }
}

/// A region of device memory handed out by the allocator.
///
/// The allocator keeps ownership of the underlying memory. This is only a
/// view which must be returned with exactly one call to
/// [DeviceAllocator::free].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceMemory {
    memory: vk::DeviceMemory,
    offset: vk::DeviceSize,
    size: vk::DeviceSize,
    heap_index: u32,
}

impl ResourceMemory {
    fn new(
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
        heap_index: u32,
    ) -> Self {
        Self {
            memory,
            offset,
            size,
            heap_index,
        }
    }

    /// The device memory block this region lives in.
    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// The region's offset from the start of the memory block.
    pub fn offset(&self) -> vk::DeviceSize {
        self.offset
    }

    /// The region's size. Always a power of two, and never smaller than the
    /// requested size.
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    pub fn heap_index(&self) -> u32 {
        self.heap_index
    }
}

/// A region which was still allocated when the allocator was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceLeak {
    pub heap_index: u32,
    pub offset: vk::DeviceSize,
    pub size: vk::DeviceSize,
}

impl fmt::Display for ResourceLeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Heap: {}, Offset: {}, Size: {}",
            self.heap_index, self.offset, self.size
        )
    }
}

/// Sub-allocates device memory from large blocks, one set of blocks per
/// physical heap.
///
/// There is no internal synchronization. Callers on multiple threads must
/// serialize access themselves.
pub struct DeviceAllocator<D: MemoryDevice> {
    /// One entry per device heap, in the device's heap order.
    heaps: Vec<Heap>,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    config: DeviceAllocatorConfig,
    device: Arc<D>,
}
