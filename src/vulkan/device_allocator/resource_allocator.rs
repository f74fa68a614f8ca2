//! Buffers and images backed by sub-allocated memory.
//!
//! These functions call straight into `ash::Device`, so the integration
//! tests cannot reach them. The `allocator_report` demo exercises the happy
//! path on a real device; the cleanup after a failed create or bind has no
//! automated coverage.

use crate::vulkan::{Buffer, Image, RenderDevice};

use super::{AllocatorError, DeviceAllocator, ResourceMemory};

use ash::vk;

impl DeviceAllocator<RenderDevice> {
    /// Create a new Vulkan device buffer backed by memory from this
    /// allocator.
    ///
    /// Nothing is leaked on failure: the buffer is destroyed and its memory
    /// is freed before the error is returned.
    pub fn create_buffer(
        &mut self,
        buffer_usage_flags: vk::BufferUsageFlags,
        memory_property_flags: vk::MemoryPropertyFlags,
        size_in_bytes: u64,
    ) -> Result<Buffer, AllocatorError> {
        let create_info = vk::BufferCreateInfo {
            size: size_in_bytes,
            usage: buffer_usage_flags,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };
        let logical_device = self.device.logical_device().clone();

        let raw = unsafe {
            logical_device.create_buffer(&create_info, None).map_err(
                |err| AllocatorError::UnableToCreateBuffer {
                    size: size_in_bytes,
                    usage: buffer_usage_flags,
                    source: err,
                },
            )?
        };
        let memory_requirements =
            unsafe { logical_device.get_buffer_memory_requirements(raw) };

        let memory = match self
            .allocate(memory_requirements, memory_property_flags)
        {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { logical_device.destroy_buffer(raw, None) };
                return Err(err);
            }
        };

        let bind_result = unsafe {
            logical_device.bind_buffer_memory(
                raw,
                memory.memory(),
                memory.offset(),
            )
        };
        if let Err(err) = bind_result {
            unsafe { logical_device.destroy_buffer(raw, None) };
            return Err(self.release_after_bind_failure(memory, err));
        }

        Ok(Buffer {
            raw,
            memory: Some(memory),
            mapped_ptr: None,
        })
    }

    /// Destroy a Vulkan buffer and free its memory. Destroying a buffer twice
    /// does nothing.
    ///
    /// # Safety
    ///
    /// - because the application must synchronize both GPU and CPU access to
    ///   this buffer to ensure it's not in use when destroyed.
    pub unsafe fn destroy_buffer(
        &mut self,
        buffer: &mut Buffer,
    ) -> Result<(), AllocatorError> {
        let logical_device = self.device.logical_device();
        if buffer.raw != vk::Buffer::null() {
            buffer.unmap(logical_device);
            logical_device.destroy_buffer(buffer.raw, None);
            buffer.raw = vk::Buffer::null();
        }
        if let Some(memory) = buffer.memory.take() {
            self.free(&memory)?;
        }
        Ok(())
    }

    /// Create a new Vulkan image backed by memory from this allocator.
    ///
    /// Nothing is leaked on failure: the image is destroyed and its memory is
    /// freed before the error is returned.
    pub fn create_image(
        &mut self,
        create_info: &vk::ImageCreateInfo<'_>,
        memory_property_flags: vk::MemoryPropertyFlags,
    ) -> Result<Image, AllocatorError> {
        let logical_device = self.device.logical_device().clone();

        let raw = unsafe {
            logical_device
                .create_image(create_info, None)
                .map_err(AllocatorError::UnableToCreateImage)?
        };
        let memory_requirements =
            unsafe { logical_device.get_image_memory_requirements(raw) };

        let memory = match self
            .allocate(memory_requirements, memory_property_flags)
        {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { logical_device.destroy_image(raw, None) };
                return Err(err);
            }
        };

        let bind_result = unsafe {
            logical_device.bind_image_memory(
                raw,
                memory.memory(),
                memory.offset(),
            )
        };
        if let Err(err) = bind_result {
            unsafe { logical_device.destroy_image(raw, None) };
            return Err(self.release_after_bind_failure(memory, err));
        }

        Ok(Image {
            raw,
            memory: Some(memory),
        })
    }

    /// Destroy a Vulkan image and free its memory. Destroying an image twice
    /// does nothing.
    ///
    /// # Safety
    ///
    /// - because the application must synchronize access to the image. There
    ///   must be no ongoing GPU operations which reference the image.
    pub unsafe fn destroy_image(
        &mut self,
        image: &mut Image,
    ) -> Result<(), AllocatorError> {
        if image.raw != vk::Image::null() {
            self.device.logical_device().destroy_image(image.raw, None);
            image.raw = vk::Image::null();
        }
        if let Some(memory) = image.memory.take() {
            self.free(&memory)?;
        }
        Ok(())
    }

    fn release_after_bind_failure(
        &mut self,
        memory: ResourceMemory,
        err: vk::Result,
    ) -> AllocatorError {
        if let Err(free_err) = self.free(&memory) {
            log::error!(
                "Unable to free memory after a failed bind: {}",
                free_err
            );
        }
        AllocatorError::UnableToBindDeviceMemory(err)
    }
}
