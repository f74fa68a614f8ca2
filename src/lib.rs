//! A Vulkan device memory sub-allocator.
//!
//! Vulkan limits how many device memory allocations an application can make,
//! and each call to the driver is slow. The [vulkan::DeviceAllocator] claims
//! large blocks of memory once and hands out small regions of them to
//! buffers and images.

pub mod logging;
pub mod vulkan;
