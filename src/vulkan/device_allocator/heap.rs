use ::{ash::vk, std::fmt};

use super::Allocation;

/// Bookkeeping for one physical memory heap.
#[derive(Debug)]
pub struct Heap {
    size: vk::DeviceSize,
    allocated_size: vk::DeviceSize,

    /// Blocks in the order they were allocated. Searches visit them in this
    /// order.
    allocations: Vec<Allocation>,
}

/// A point-in-time summary of a heap, used for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapInfo {
    pub heap_index: u32,
    pub size: vk::DeviceSize,
    pub allocated_size: vk::DeviceSize,
    pub sub_allocated_size: vk::DeviceSize,
    pub block_count: usize,
}

impl Heap {
    /// An empty heap with the given physical capacity.
    pub fn new(size: vk::DeviceSize) -> Self {
        Self {
            size,
            allocated_size: 0,
            allocations: vec![],
        }
    }

    /// Bytes claimed from the device across every block in the heap.
    pub fn allocated_size(&self) -> vk::DeviceSize {
        self.allocated_size
    }

    /// True when the heap can hold one more block of the given size.
    pub fn has_capacity_for(&self, block_size: vk::DeviceSize) -> bool {
        self.allocated_size
            .checked_add(block_size)
            .map_or(false, |total| total <= self.size)
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn allocations_mut(&mut self) -> &mut [Allocation] {
        &mut self.allocations
    }

    /// Append a newly allocated block and account for its size.
    pub fn push_block(&mut self, allocation: Allocation) {
        self.allocated_size += allocation.size();
        self.allocations.push(allocation);
    }

    /// Remove every block from the heap, oldest first. The heap is left
    /// empty with no allocated bytes.
    pub fn take_allocations(&mut self) -> Vec<Allocation> {
        self.allocated_size = 0;
        std::mem::take(&mut self.allocations)
    }

    /// Summarize the heap's current state.
    pub fn info(&self, heap_index: u32) -> HeapInfo {
        HeapInfo {
            heap_index,
            size: self.size,
            allocated_size: self.allocated_size,
            sub_allocated_size: self
                .allocations
                .iter()
                .map(Allocation::sub_allocated_size)
                .sum(),
            block_count: self.allocations.len(),
        }
    }
}

impl fmt::Display for HeapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "heap {}: {}MB available, {} blocks ({}MB), {}KB in use",
            self.heap_index,
            self.size / 1_000_000,
            self.block_count,
            self.allocated_size / 1_000_000,
            self.sub_allocated_size / 1000,
        )
    }
}
