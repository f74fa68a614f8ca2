// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use {
    ash::vk::{self, Handle},
    ccthw_suballocator::vulkan::MemoryDevice,
    std::sync::Mutex,
};

pub const DEVICE_LOCAL: vk::MemoryPropertyFlags =
    vk::MemoryPropertyFlags::DEVICE_LOCAL;

pub fn host_coherent() -> vk::MemoryPropertyFlags {
    vk::MemoryPropertyFlags::HOST_VISIBLE
        | vk::MemoryPropertyFlags::HOST_COHERENT
}

/// Memory requirements which accept any of the memory types in
/// `memory_type_bits`.
pub fn requirements(
    size: vk::DeviceSize,
    memory_type_bits: u32,
) -> vk::MemoryRequirements {
    vk::MemoryRequirements {
        size,
        alignment: 1,
        memory_type_bits,
    }
}

#[derive(Default)]
struct FakeState {
    next_handle: u64,
    live: Vec<vk::DeviceMemory>,
    freed: Vec<vk::DeviceMemory>,
    allocate_calls: Vec<(vk::DeviceSize, u32)>,
    fail_next: Option<vk::Result>,
}

/// A device which hands out synthetic memory handles and records every
/// call made against it.
pub struct FakeDevice {
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    state: Mutex<FakeState>,
}

impl FakeDevice {
    pub fn new(
        heap_sizes: &[vk::DeviceSize],
        memory_types: &[(vk::MemoryPropertyFlags, u32)],
    ) -> Self {
        let mut memory_properties = vk::PhysicalDeviceMemoryProperties {
            memory_heap_count: heap_sizes.len() as u32,
            memory_type_count: memory_types.len() as u32,
            ..Default::default()
        };
        for (i, size) in heap_sizes.iter().enumerate() {
            memory_properties.memory_heaps[i] = vk::MemoryHeap {
                size: *size,
                flags: vk::MemoryHeapFlags::empty(),
            };
        }
        for (i, (property_flags, heap_index)) in
            memory_types.iter().enumerate()
        {
            memory_properties.memory_types[i] = vk::MemoryType {
                property_flags: *property_flags,
                heap_index: *heap_index,
            };
        }
        Self {
            memory_properties,
            state: Mutex::new(FakeState {
                next_handle: 1,
                ..Default::default()
            }),
        }
    }

    /// A single device-local heap with a single memory type.
    pub fn single_heap(heap_size: vk::DeviceSize) -> Self {
        Self::new(&[heap_size], &[(DEVICE_LOCAL, 0)])
    }

    /// A layout like a discrete gpu with resizable BAR:
    ///
    /// - type 0: device local, heap 0
    /// - type 1: host visible + coherent, heap 1
    /// - type 2: device local + host visible + coherent, heap 0
    pub fn discrete(heap_size: vk::DeviceSize) -> Self {
        Self::new(
            &[heap_size, heap_size],
            &[
                (DEVICE_LOCAL, 0),
                (host_coherent(), 1),
                (DEVICE_LOCAL | host_coherent(), 0),
            ],
        )
    }

    /// Make the next call to allocate_block fail with the given result.
    pub fn fail_next_allocation(&self, result: vk::Result) {
        self.state.lock().unwrap().fail_next = Some(result);
    }

    /// Every `(allocation_size, memory_type_index)` requested so far.
    pub fn allocate_calls(&self) -> Vec<(vk::DeviceSize, u32)> {
        self.state.lock().unwrap().allocate_calls.clone()
    }

    pub fn live_blocks(&self) -> Vec<vk::DeviceMemory> {
        self.state.lock().unwrap().live.clone()
    }

    pub fn freed_blocks(&self) -> Vec<vk::DeviceMemory> {
        self.state.lock().unwrap().freed.clone()
    }
}

impl MemoryDevice for FakeDevice {
    fn memory_properties(&self) -> vk::PhysicalDeviceMemoryProperties {
        self.memory_properties
    }

    unsafe fn allocate_block(
        &self,
        allocate_info: &vk::MemoryAllocateInfo<'_>,
    ) -> Result<vk::DeviceMemory, vk::Result> {
        let mut state = self.state.lock().unwrap();
        if let Some(result) = state.fail_next.take() {
            return Err(result);
        }
        let memory = vk::DeviceMemory::from_raw(state.next_handle);
        state.next_handle += 1;
        state.live.push(memory);
        state.allocate_calls.push((
            allocate_info.allocation_size,
            allocate_info.memory_type_index,
        ));
        Ok(memory)
    }

    unsafe fn free_block(&self, memory: vk::DeviceMemory) {
        let mut state = self.state.lock().unwrap();
        assert!(
            state.live.contains(&memory),
            "freed a block which is not live: {:?}",
            memory
        );
        state.live.retain(|live| *live != memory);
        state.freed.push(memory);
    }
}
