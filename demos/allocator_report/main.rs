//! Create a Vulkan device, carve a few buffers and an image out of it with
//! the sub-allocator, and log how much device memory was used.
//!
//! Run with `RUST_LOG=trace` to see every block and sub-allocation.

use {
    anyhow::{Context, Result},
    ash::vk,
    ccthw_suballocator::{
        logging::{self, PrettyList},
        vulkan::{DeviceAllocator, RenderDevice},
    },
    std::sync::Arc,
};

fn main() -> Result<()> {
    let _logger = logging::setup("info")?;

    let entry = unsafe { ash::Entry::load()? };
    let app_info =
        vk::ApplicationInfo::default().api_version(vk::API_VERSION_1_1);
    let create_info =
        vk::InstanceCreateInfo::default().application_info(&app_info);
    let instance = unsafe {
        entry
            .create_instance(&create_info, None)
            .context("unable to create the Vulkan instance")?
    };

    let result = run(&instance);

    unsafe { instance.destroy_instance(None) };
    result
}

/// Create a logical device with a single queue on the first physical device.
fn run(instance: &ash::Instance) -> Result<()> {
    let physical_device = unsafe { instance.enumerate_physical_devices()? }
        .into_iter()
        .next()
        .context("no Vulkan physical devices are available")?;

    // every physical device has at least one queue family
    let priorities = [1.0];
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities)];
    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos);
    let logical_device = unsafe {
        instance
            .create_device(physical_device, &device_create_info, None)
            .context("unable to create the logical device")?
    };

    let result =
        allocate_resources(instance, physical_device, logical_device.clone());

    unsafe { logical_device.destroy_device(None) };
    result
}

fn allocate_resources(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    logical_device: ash::Device,
) -> Result<()> {
    let render_device = Arc::new(unsafe {
        RenderDevice::new(instance, physical_device, logical_device)
    });
    let mut allocator = DeviceAllocator::new(render_device.clone());

    let mut vertices = allocator.create_buffer(
        vk::BufferUsageFlags::VERTEX_BUFFER
            | vk::BufferUsageFlags::TRANSFER_DST,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
        64 * 1024,
    )?;
    let mut staging = allocator.create_buffer(
        vk::BufferUsageFlags::TRANSFER_SRC,
        vk::MemoryPropertyFlags::HOST_VISIBLE
            | vk::MemoryPropertyFlags::HOST_COHERENT,
        4096,
    )?;
    unsafe {
        let ptr = staging.map(render_device.logical_device())?;
        std::ptr::write_bytes(ptr as *mut u8, 0xff, 4096);
        staging.unmap(render_device.logical_device());
    }

    let image_create_info = vk::ImageCreateInfo {
        image_type: vk::ImageType::TYPE_2D,
        format: vk::Format::R8G8B8A8_UNORM,
        extent: vk::Extent3D {
            width: 256,
            height: 256,
            depth: 1,
        },
        mip_levels: 1,
        array_layers: 1,
        samples: vk::SampleCountFlags::TYPE_1,
        tiling: vk::ImageTiling::OPTIMAL,
        usage: vk::ImageUsageFlags::SAMPLED
            | vk::ImageUsageFlags::TRANSFER_DST,
        sharing_mode: vk::SharingMode::EXCLUSIVE,
        initial_layout: vk::ImageLayout::UNDEFINED,
        ..Default::default()
    };
    let mut texture = allocator.create_image(
        &image_create_info,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
    )?;

    log::info!("Device memory: {}", PrettyList(&allocator.heap_info()));
    log::info!(
        "Total device allocation: {}MB",
        allocator.total_device_allocation() / 1_000_000
    );

    // safe because nothing was ever submitted to the device
    unsafe {
        allocator.destroy_image(&mut texture)?;
        allocator.destroy_buffer(&mut staging)?;
        allocator.destroy_buffer(&mut vertices)?;
    }

    Ok(())
}
