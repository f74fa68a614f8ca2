mod common;

use {
    ash::vk,
    ccthw_suballocator::vulkan::{DeviceAllocator, DeviceAllocatorConfig},
    common::{requirements, FakeDevice, DEVICE_LOCAL},
    std::sync::{Arc, Mutex},
};

/// An error-level record along with how many blocks the watched device had
/// freed when it was logged.
struct Recorded {
    message: String,
    freed_blocks: usize,
}

/// Records error-level logs. This binary holds a single test because the
/// logger is process-wide.
struct RecordingLogger {
    device: Mutex<Option<Arc<FakeDevice>>>,
    records: Mutex<Vec<Recorded>>,
}

impl log::Log for RecordingLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Error
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let freed_blocks = self
            .device
            .lock()
            .unwrap()
            .as_ref()
            .map_or(0, |device| device.freed_blocks().len());
        self.records.lock().unwrap().push(Recorded {
            message: record.args().to_string(),
            freed_blocks,
        });
    }

    fn flush(&self) {}
}

static LOGGER: RecordingLogger = RecordingLogger {
    device: Mutex::new(None),
    records: Mutex::new(Vec::new()),
};

const BLOCK_SIZE: vk::DeviceSize = 256;

#[test]
fn leaks_are_logged_before_blocks_are_freed() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(log::LevelFilter::Error);

    let device = Arc::new(FakeDevice::single_heap(1024));
    *LOGGER.device.lock().unwrap() = Some(device.clone());

    let mut allocator = DeviceAllocator::with_config(
        device.clone(),
        DeviceAllocatorConfig::default().with_block_size(BLOCK_SIZE),
    )
    .unwrap();
    let first = allocator
        .allocate(requirements(16, 0b1), DEVICE_LOCAL)
        .unwrap();
    let leaked = allocator
        .allocate(requirements(128, 0b1), DEVICE_LOCAL)
        .unwrap();
    assert_eq!(leaked.offset(), 16);
    allocator.free(&first).unwrap();
    assert!(LOGGER.records.lock().unwrap().is_empty());

    drop(allocator);

    let records = LOGGER.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0]
        .message
        .contains("Heap: 0, Offset: 16, Size: 128"));
    assert_eq!(records[0].freed_blocks, 0);
    assert_eq!(device.freed_blocks().len(), 1);
}
