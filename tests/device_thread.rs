// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Routing of native calls between calling threads and the device thread.
*/

use std::sync::Arc;

use texels_and_buffers::addressing::SubresourceBox;
use texels_and_buffers::{
    BufferBuilder, Device, DeviceConfig, Error, GpuBindings, Resource, SoftwareDevice,
    Texture2DBuilder, Usage,
};

fn setup_with(config: DeviceConfig) -> (Arc<SoftwareDevice>, Arc<Device>) {
    let native = Arc::new(SoftwareDevice::new());
    let device = Device::with_config(native.clone(), config).expect("device");
    (native, device)
}

fn setup() -> (Arc<SoftwareDevice>, Arc<Device>) {
    setup_with(DeviceConfig::default())
}

#[test]
fn thread_name_is_configurable() {
    let (_, device) = setup_with(DeviceConfig::default().thread_name("render context"));
    let name = device
        .gateway()
        .run_blocking(|_| std::thread::current().name().map(str::to_string))
        .unwrap();
    assert_eq!(name.as_deref(), Some("render context"));
    assert!(!device.gateway().is_device_thread());
}

#[test]
fn reads_and_copies_run_on_the_device_thread() {
    let (native, device) = setup();
    let gateway = device.gateway().thread_id();
    let source = BufferBuilder::<u32>::new()
        .with_initial_data(vec![1, 2, 3, 4])
        .create(&device)
        .unwrap();
    let readback = BufferBuilder::<u32>::new()
        .with_usage(Usage::StagingRead)
        .with_bindings(GpuBindings::NONE)
        .with_length(4)
        .create(&device)
        .unwrap();
    native.clear_calls();
    source.copy_to(&readback).unwrap();
    assert_eq!(readback.read().unwrap(), [1, 2, 3, 4]);
    let calls = native.calls();
    assert_eq!(
        calls.iter().map(|c| c.name).collect::<Vec<_>>(),
        ["copy_resource", "map_subresource", "unmap_subresource"]
    );
    assert!(calls.iter().all(|c| c.thread == gateway));
    source.dispose().unwrap();
    readback.dispose().unwrap();
}

#[test]
fn update_region_writes_stay_on_the_calling_thread() {
    let (native, device) = setup();
    let texture = Texture2DBuilder::<u8>::new(2, 2)
        .with_usage(Usage::Write)
        .create(&device)
        .unwrap();
    native.clear_calls();
    texture
        .write(&[1, 2, 3, 4], 0, SubresourceBox::area(0, 2, 0, 2))
        .unwrap();
    let calls = native.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].thread, std::thread::current().id());
    texture.dispose().unwrap();
}

#[test]
fn concurrent_writers_do_not_interleave() {
    let (_, device) = setup();
    let buffer = BufferBuilder::<u32>::new()
        .with_usage(Usage::StagingReadWrite)
        .with_bindings(GpuBindings::NONE)
        .with_length(64)
        .create(&device)
        .unwrap();
    std::thread::scope(|s| {
        for t in 0..4u32 {
            let buffer = &buffer;
            s.spawn(move || {
                for round in 0..25 {
                    let value = t * 1000 + round;
                    buffer.write(&[value; 16], t * 16).unwrap();
                }
            });
        }
    });
    let values = buffer.read().unwrap();
    for (t, chunk) in values.chunks(16).enumerate() {
        assert_eq!(chunk, [t as u32 * 1000 + 24; 16]);
    }
    buffer.dispose().unwrap();
}

#[test]
fn concurrent_read_write_sections_are_serialized() {
    let (_, device) = setup();
    let buffer = BufferBuilder::<u32>::new()
        .with_usage(Usage::StagingReadWrite)
        .with_bindings(GpuBindings::NONE)
        .with_length(1)
        .create(&device)
        .unwrap();
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..50 {
                    buffer.read_write(|v| v[0] += 1).unwrap();
                }
            });
        }
    });
    assert_eq!(buffer.read().unwrap(), [400]);
    buffer.dispose().unwrap();
}

#[test]
fn a_panicking_job_reports_disconnect_and_the_thread_survives() {
    let (_, device) = setup();
    let result: Result<(), Error> = device.gateway().run_blocking(|_| panic!("boom"));
    assert!(matches!(result, Err(Error::GatewayDisconnected)));
    assert_eq!(device.gateway().run_blocking(|_| 7).unwrap(), 7);
}

#[test]
fn bounded_queue_still_completes_async_writes() {
    let (native, device) = setup_with(DeviceConfig::default().queue_capacity(2));
    let buffer = BufferBuilder::<u8>::new()
        .with_usage(Usage::StagingWrite)
        .with_bindings(GpuBindings::NONE)
        .with_length(32)
        .create(&device)
        .unwrap();
    for i in 0..32u8 {
        buffer.write(&[i], i as u32).unwrap();
    }
    device.flush().unwrap();
    assert_eq!(
        native.subresource_contents(buffer.id(), 0).unwrap(),
        (0..32).collect::<Vec<u8>>()
    );
    buffer.dispose().unwrap();
}

#[test]
fn dispose_waits_for_queued_writes() {
    let (native, device) = setup();
    let buffer = BufferBuilder::<u32>::new()
        .with_usage(Usage::StagingWrite)
        .with_bindings(GpuBindings::NONE)
        .with_length(8)
        .create(&device)
        .unwrap();
    let id = buffer.id();
    native.clear_calls();
    buffer.write(&[1; 8], 0).unwrap();
    buffer.dispose().unwrap();
    let names: Vec<_> = native.calls().iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        ["map_subresource", "unmap_subresource", "release_resource"]
    );
    assert!(!native.contains(id));
}
