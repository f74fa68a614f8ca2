use ::{ash::vk, std::sync::Arc};

use super::{
    find_memory_type, memory_type, Allocation, AllocatorError,
    DeviceAllocator, DeviceAllocatorConfig, Heap, HeapInfo, MemoryDevice,
    MemorySection, OwnedMemory, ResourceLeak, ResourceMemory,
};

use crate::logging::PrettyList;

impl<D: MemoryDevice> DeviceAllocator<D> {
    /// Create an allocator with the default 256MB block size.
    ///
    /// No device memory is allocated until the first call to `allocate`.
    pub fn new(device: Arc<D>) -> Self {
        Self::build(device, DeviceAllocatorConfig::default())
    }

    /// Create an allocator with a custom configuration.
    ///
    /// # Errors
    ///
    /// * The block size must be a non-zero power of two.
    pub fn with_config(
        device: Arc<D>,
        config: DeviceAllocatorConfig,
    ) -> Result<Self, AllocatorError> {
        if !config.block_size.is_power_of_two() {
            return Err(AllocatorError::InvalidBlockSize(config.block_size));
        }
        Ok(Self::build(device, config))
    }

    fn build(device: Arc<D>, config: DeviceAllocatorConfig) -> Self {
        let memory_properties = device.memory_properties();
        let heap_count = (memory_properties.memory_heap_count as usize)
            .min(memory_properties.memory_heaps.len());
        let heaps: Vec<Heap> = memory_properties.memory_heaps[..heap_count]
            .iter()
            .map(|memory_heap| Heap::new(memory_heap.size))
            .collect();

        let allocator = Self {
            heaps,
            memory_properties,
            config,
            device,
        };
        log::debug!(
            "Device memory heaps: {}",
            PrettyList(&allocator.heap_info())
        );
        allocator
    }

    pub fn config(&self) -> DeviceAllocatorConfig {
        self.config
    }

    /// The device which every block is allocated from.
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Allocate a region of device memory which satisfies the requirements
    /// and has every requested property.
    ///
    /// The region's size is the requested size rounded up to the next power
    /// of two. A new block is requested from the device only when no existing
    /// block in the heap has a large enough gap.
    ///
    /// # Errors
    ///
    /// * `AllocationTooLarge` when the request is bigger than one block.
    /// * `NoSuitableMemoryType` when no memory type matches.
    /// * `OutOfMemory` when the heap is full or the device refuses to
    ///   allocate another block.
    pub fn allocate(
        &mut self,
        memory_requirements: vk::MemoryRequirements,
        property_flags: vk::MemoryPropertyFlags,
    ) -> Result<ResourceMemory, AllocatorError> {
        let block_size = self.config.block_size;
        if memory_requirements.size > block_size {
            return Err(AllocatorError::AllocationTooLarge {
                requested: memory_requirements.size,
                block_size,
            });
        }
        let section = find_memory_type(
            &self.memory_properties,
            memory_requirements,
            property_flags,
        )?;

        // the block size is a power of two, so this never exceeds it
        let size = memory_requirements.size.max(1).next_power_of_two();

        let existing = self.suballocate(
            section,
            memory_requirements,
            property_flags,
            size,
        );
        let resource = match existing {
            Some(resource) => resource,
            None => {
                self.allocate_block(section)?;
                self.suballocate(
                    section,
                    memory_requirements,
                    property_flags,
                    size,
                )
                .ok_or(AllocatorError::OutOfMemory {
                    heap_index: section.heap_index,
                    block_size,
                    source: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
                })?
            }
        };

        log::trace!("Suballocated {}KB.", resource.size() / 1000);

        Ok(resource)
    }

    /// Return a region to the allocator.
    ///
    /// The block which held the region is kept for future allocations, even
    /// if it is now completely empty.
    ///
    /// # Errors
    ///
    /// * `UnknownResource` when the region is not currently allocated. This
    ///   includes regions which have already been freed.
    pub fn free(
        &mut self,
        resource: &ResourceMemory,
    ) -> Result<(), AllocatorError> {
        let unknown = || AllocatorError::UnknownResource {
            heap_index: resource.heap_index(),
            offset: resource.offset(),
        };
        let allocation = self
            .heaps
            .get_mut(resource.heap_index() as usize)
            .and_then(|heap| {
                heap.allocations_mut().iter_mut().find(|allocation| {
                    allocation.memory() == resource.memory()
                })
            })
            .ok_or_else(unknown)?;
        let size =
            allocation.release(resource.offset()).ok_or_else(unknown)?;

        log::trace!("Subfreed {}KB.", size / 1000);

        Ok(())
    }

    /// The total number of bytes allocated from the device across all heaps.
    pub fn total_device_allocation(&self) -> vk::DeviceSize {
        self.heaps.iter().map(Heap::allocated_size).sum()
    }

    /// Summaries for every heap, in the device's heap order.
    pub fn heap_info(&self) -> Vec<HeapInfo> {
        self.heaps
            .iter()
            .enumerate()
            .map(|(heap_index, heap)| heap.info(heap_index as u32))
            .collect()
    }

    /// Every region which is currently allocated.
    pub fn leaks(&self) -> Vec<ResourceLeak> {
        self.heaps
            .iter()
            .enumerate()
            .flat_map(|(heap_index, heap)| {
                heap.allocations().iter().flat_map(move |allocation| {
                    allocation.live_regions().map(move |(offset, size)| {
                        ResourceLeak {
                            heap_index: heap_index as u32,
                            offset,
                            size,
                        }
                    })
                })
            })
            .collect()
    }

    /// Claim the first gap which fits, searching blocks in allocation order.
    ///
    /// Blocks whose memory type is not acceptable for this request are
    /// skipped, even when they share the heap.
    fn suballocate(
        &mut self,
        section: MemorySection,
        memory_requirements: vk::MemoryRequirements,
        property_flags: vk::MemoryPropertyFlags,
        size: vk::DeviceSize,
    ) -> Option<ResourceMemory> {
        let memory_properties = &self.memory_properties;
        let heap = self.heaps.get_mut(section.heap_index as usize)?;
        heap.allocations_mut()
            .iter_mut()
            .filter(|allocation| {
                memory_type::supports(
                    memory_properties,
                    allocation.memory_type_index(),
                    memory_requirements,
                    property_flags,
                )
            })
            .find_map(|allocation| {
                let offset = allocation
                    .suballocate(size, memory_requirements.alignment)?;
                Some(ResourceMemory::new(
                    allocation.memory(),
                    offset,
                    size,
                    section.heap_index,
                ))
            })
    }

    /// Request one new block from the device and append it to the heap.
    fn allocate_block(
        &mut self,
        section: MemorySection,
    ) -> Result<(), AllocatorError> {
        let block_size = self.config.block_size;
        let out_of_memory = |source: vk::Result| AllocatorError::OutOfMemory {
            heap_index: section.heap_index,
            block_size,
            source,
        };

        let heap = self
            .heaps
            .get_mut(section.heap_index as usize)
            .ok_or_else(|| {
                out_of_memory(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
            })?;
        if !heap.has_capacity_for(block_size) {
            return Err(out_of_memory(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        }

        let allocate_info = vk::MemoryAllocateInfo {
            allocation_size: block_size,
            memory_type_index: section.memory_type_index,
            ..Default::default()
        };
        let raw = unsafe {
            self.device
                .allocate_block(&allocate_info)
                .map_err(out_of_memory)?
        };
        let memory = OwnedMemory::new(raw).ok_or_else(|| {
            out_of_memory(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
        })?;
        heap.push_block(Allocation::new(
            memory,
            section.memory_type_index,
            block_size,
        ));

        log::debug!(
            "Allocated {}MB (total: {}MB).",
            block_size / 1_000_000,
            self.total_device_allocation() / 1_000_000
        );

        Ok(())
    }
}

impl<D: MemoryDevice> Drop for DeviceAllocator<D> {
    /// Report every region that was never freed, then return all blocks to
    /// the device.
    ///
    /// # DANGER
    ///
    /// The blocks are released even when regions are still allocated. Any
    /// buffer or image still bound to them must not be used afterwards.
    fn drop(&mut self) {
        let leaks = self.leaks();
        if !leaks.is_empty() {
            log::error!("GPU allocation leak: {}", PrettyList(&leaks));
        }

        let mut remaining = self.total_device_allocation();
        for heap in &mut self.heaps {
            for allocation in heap.take_allocations() {
                let size = allocation.size();
                unsafe {
                    self.device
                        .free_block(allocation.into_memory().into_raw());
                }
                remaining -= size;
                log::debug!(
                    "Freed {}MB (total: {}MB).",
                    size / 1_000_000,
                    remaining / 1_000_000
                );
            }
        }
    }
}
