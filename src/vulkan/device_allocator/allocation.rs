use ::{ash::vk, std::collections::BTreeMap};

/// Exclusive ownership of a single device memory handle.
///
/// This type is deliberately neither Clone nor Copy. The only way to get the
/// handle back out for release is to consume the wrapper with `into_raw`.
#[derive(Debug, PartialEq, Eq)]
pub struct OwnedMemory(vk::DeviceMemory);

impl OwnedMemory {
    /// Take ownership of a device memory handle. Returns None for a null
    /// handle.
    pub fn new(memory: vk::DeviceMemory) -> Option<Self> {
        if memory == vk::DeviceMemory::null() {
            None
        } else {
            Some(Self(memory))
        }
    }

    /// Borrow the raw handle. Ownership is not transferred.
    pub fn raw(&self) -> vk::DeviceMemory {
        self.0
    }

    /// Give up ownership of the raw handle. The caller is responsible for
    /// freeing it.
    pub fn into_raw(self) -> vk::DeviceMemory {
        self.0
    }
}

/// One large block of device memory and the regions currently carved out of
/// it.
#[derive(Debug)]
pub struct Allocation {
    memory: OwnedMemory,
    memory_type_index: u32,
    size: vk::DeviceSize,
    sub_allocated_size: vk::DeviceSize,

    /// Every live region in the block, keyed by offset and valued by size.
    resources: BTreeMap<vk::DeviceSize, vk::DeviceSize>,
}

impl Allocation {
    /// Wrap a freshly allocated block. No regions are in use.
    pub fn new(
        memory: OwnedMemory,
        memory_type_index: u32,
        size: vk::DeviceSize,
    ) -> Self {
        Self {
            memory,
            memory_type_index,
            size,
            sub_allocated_size: 0,
            resources: BTreeMap::new(),
        }
    }

    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory.raw()
    }

    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// The sum of all live region sizes in this block.
    pub fn sub_allocated_size(&self) -> vk::DeviceSize {
        self.sub_allocated_size
    }

    /// Iterate over `(offset, size)` for every live region, lowest offset
    /// first.
    pub fn live_regions(
        &self,
    ) -> impl Iterator<Item = (vk::DeviceSize, vk::DeviceSize)> + '_ {
        self.resources
            .iter()
            .map(|(&offset, &size)| (offset, size))
    }

    /// Find the first gap which can hold `size` bytes starting at an offset
    /// that is a multiple of `alignment`.
    ///
    /// Gaps are visited from the front of the block to the back, so the
    /// lowest usable offset always wins.
    pub fn find_gap(
        &self,
        size: vk::DeviceSize,
        alignment: vk::DeviceSize,
    ) -> Option<vk::DeviceSize> {
        let alignment = alignment.max(1);
        let fits_before = |start: vk::DeviceSize, limit: vk::DeviceSize| {
            let offset = start.checked_next_multiple_of(alignment)?;
            let end = offset.checked_add(size)?;
            (end <= limit).then_some(offset)
        };

        let mut previous_end = 0;
        for (&begin, &region_size) in &self.resources {
            if let Some(offset) = fits_before(previous_end, begin) {
                return Some(offset);
            }
            previous_end = begin + region_size;
        }
        fits_before(previous_end, self.size)
    }

    /// Claim the first gap which fits the region and return the region's
    /// offset. Nothing changes when no gap fits.
    pub fn suballocate(
        &mut self,
        size: vk::DeviceSize,
        alignment: vk::DeviceSize,
    ) -> Option<vk::DeviceSize> {
        let offset = self.find_gap(size, alignment)?;
        self.resources.insert(offset, size);
        self.sub_allocated_size += size;
        Some(offset)
    }

    /// Release the region which starts at `offset`, returning its size.
    /// Returns None when no region starts there.
    pub fn release(
        &mut self,
        offset: vk::DeviceSize,
    ) -> Option<vk::DeviceSize> {
        let size = self.resources.remove(&offset)?;
        self.sub_allocated_size -= size;
        Some(size)
    }

    /// Consume the block and hand back ownership of the memory handle.
    pub fn into_memory(self) -> OwnedMemory {
        self.memory
    }
}
