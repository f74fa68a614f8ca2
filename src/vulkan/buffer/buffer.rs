use crate::vulkan::{AllocatorError, ResourceMemory};

use super::Buffer;

use ash::vk;

impl Buffer {
    /// The region of device memory bound to this buffer.
    pub fn memory(&self) -> Option<&ResourceMemory> {
        self.memory.as_ref()
    }

    /// True after the owning allocator has destroyed the buffer.
    pub fn is_destroyed(&self) -> bool {
        self.raw == vk::Buffer::null()
    }

    /// Acquire a CPU-accessible pointer to the memory used by this buffer.
    /// Mapping an already mapped buffer returns the existing pointer.
    ///
    /// # Safety
    ///
    /// * The buffer must have been created with the HOST_VISIBLE property.
    /// * Buffers share device memory blocks, and a block can only be mapped
    ///   once at a time. No other buffer in the same block may be mapped.
    /// * Memory that is not HOST_COHERENT must be flushed by the application.
    pub unsafe fn map(
        &mut self,
        logical_device: &ash::Device,
    ) -> Result<*mut std::ffi::c_void, AllocatorError> {
        if let Some(ptr) = self.mapped_ptr {
            return Ok(ptr);
        }
        let memory = self
            .memory
            .ok_or(AllocatorError::UnableToMapMemory(
                vk::Result::ERROR_MEMORY_MAP_FAILED,
            ))?;
        let ptr = logical_device
            .map_memory(
                memory.memory(),
                memory.offset(),
                memory.size(),
                vk::MemoryMapFlags::empty(),
            )
            .map_err(AllocatorError::UnableToMapMemory)?;
        self.mapped_ptr = Some(ptr);
        Ok(ptr)
    }

    /// Unmap the buffer's memory. Does nothing if the buffer is not mapped.
    ///
    /// # Safety
    ///
    /// The pointer returned by map() must not be used afterwards.
    pub unsafe fn unmap(&mut self, logical_device: &ash::Device) {
        if let (Some(_), Some(memory)) = (self.mapped_ptr.take(), self.memory)
        {
            logical_device.unmap_memory(memory.memory());
        }
    }
}
