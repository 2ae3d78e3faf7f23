// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Texture access against the software device, with tight and padded row pitches.
*/

use std::sync::Arc;

use rstest::rstest;
use texels_and_buffers::addressing::SubresourceBox;
use texels_and_buffers::pixel_formats::Rgba8Unorm;
use texels_and_buffers::{
    Device, Error, GpuBindings, Resource, SoftwareDevice, SoftwareDeviceConfig, Texture1DBuilder,
    Texture2DBuilder, Texture3DBuilder, Usage,
};

fn setup(alignment: usize) -> (Arc<SoftwareDevice>, Arc<Device>) {
    let native = Arc::new(SoftwareDevice::with_config(
        SoftwareDeviceConfig::default().row_pitch_alignment(alignment),
    ));
    let device = Device::new(native.clone()).expect("device");
    (native, device)
}

fn rgba(i: u32) -> Rgba8Unorm {
    let b = i.to_le_bytes();
    Rgba8Unorm {
        r: b[0],
        g: b[1],
        b: b[2],
        a: 255,
    }
}

#[test]
fn mipmapped_256_square_reads_whole_chain() {
    let (_, device) = setup(1);
    let texture = Texture2DBuilder::<u8>::new(256, 256)
        .with_usage(Usage::StagingRead)
        .with_bindings(GpuBindings::NONE)
        .with_mipmaps(true)
        .create(&device)
        .unwrap();
    assert_eq!(texture.num_mips(), 9);
    assert_eq!(texture.mip_width(0).unwrap(), 256);
    assert_eq!(texture.mip_width(7).unwrap(), 2);
    assert_eq!(texture.mip_width(8).unwrap(), 1);
    assert!(matches!(texture.mip_width(9), Err(Error::Bounds(_))));

    let expected: usize = (0..9)
        .map(|m| {
            (texture.mip_width(m).unwrap() * texture.mip_height(m).unwrap()) as usize
        })
        .sum();
    assert_eq!(texture.read_all().unwrap().len(), expected);
    assert_eq!(texture.size(), expected as u64);
    texture.dispose().unwrap();
}

#[rstest]
#[case::tight(1)]
#[case::padded(256)]
fn write_then_read_whole_mip(#[case] alignment: usize) {
    let (native, device) = setup(alignment);
    let texture = Texture2DBuilder::<Rgba8Unorm>::new(5, 3)
        .with_usage(Usage::StagingReadWrite)
        .with_bindings(GpuBindings::NONE)
        .create(&device)
        .unwrap();
    let data: Vec<Rgba8Unorm> = (0..15).map(rgba).collect();
    texture
        .write(&data, 0, SubresourceBox::area(0, 5, 0, 3))
        .unwrap();
    let read = texture.read(0).unwrap();
    assert_eq!((read.width(), read.height(), read.depth()), (5, 3, 1));
    assert_eq!(&*read, &data[..]);
    assert_eq!(read[(4, 2)], rgba(14));
    if alignment > 1 {
        assert_eq!(native.row_pitch(texture.id(), 0), Some(256));
    }
    texture.dispose().unwrap();
}

#[rstest]
#[case::tight(1)]
#[case::padded(16)]
fn discard_write_wraps_rows_from_uv(#[case] alignment: usize) {
    let (native, device) = setup(alignment);
    let texture = Texture2DBuilder::<u16>::new(3, 3)
        .with_usage(Usage::DiscardWrite)
        .create(&device)
        .unwrap();
    // starts at (2, 0) and wraps onto row 1
    texture.discard_write(&[7, 8, 9], 0, 2, 0).unwrap();
    let contents = native.subresource_contents(texture.id(), 0).unwrap();
    let texels: Vec<u16> = contents
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(texels, [0, 0, 7, 8, 9, 0, 0, 0, 0]);
    assert!(matches!(
        texture.discard_write(&[1; 9], 0, 1, 0),
        Err(Error::Bounds(_))
    ));
    assert!(matches!(
        texture.discard_write(&[1], 0, 3, 0),
        Err(Error::Bounds(_))
    ));
    texture.dispose().unwrap();
}

#[test]
fn region_update_uses_update_subresource_region() {
    let (native, device) = setup(8);
    let texture = Texture2DBuilder::<u8>::new(4, 4)
        .with_usage(Usage::Write)
        .create(&device)
        .unwrap();
    native.clear_calls();
    texture
        .write(&[1, 2, 3, 4], 0, SubresourceBox::area(1, 3, 2, 4))
        .unwrap();
    assert_eq!(native.call_count(), 1);
    assert_eq!(native.count_of("update_subresource_region"), 1);
    let contents = native.subresource_contents(texture.id(), 0).unwrap();
    assert_eq!(
        contents,
        [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0]
    );
    assert!(matches!(
        texture.write(&[1, 2, 3], 0, SubresourceBox::area(0, 2, 0, 2)),
        Err(Error::Bounds(_))
    ));
    assert!(matches!(
        texture.write(&[1, 2], 0, SubresourceBox::area(3, 5, 0, 1)),
        Err(Error::Bounds(_))
    ));
    texture.dispose().unwrap();
}

#[rstest]
#[case::tight(1)]
#[case::padded(64)]
fn volume_round_trip(#[case] alignment: usize) {
    let (_, device) = setup(alignment);
    let texture = Texture3DBuilder::<f32>::new(4, 2, 3)
        .with_usage(Usage::StagingReadWrite)
        .with_bindings(GpuBindings::NONE)
        .create(&device)
        .unwrap();
    let data: Vec<f32> = (0..24).map(|i| i as f32).collect();
    texture
        .write(&data, 0, SubresourceBox::volume_of(0, 4, 0, 2, 0, 3))
        .unwrap();
    let read = texture.read(0).unwrap();
    assert_eq!(read.get(3, 1, 2), Some(&23.0));
    assert_eq!(read.into_vec(), data);

    texture
        .read_write(0, |mut view| {
            view.set(0, 0, 1, -1.0).unwrap();
            assert!(view.get(4, 0, 0).is_err());
        })
        .unwrap();
    assert_eq!(texture.read(0).unwrap().get(0, 0, 1), Some(&-1.0));
    texture.dispose().unwrap();
}

#[test]
fn volume_discard_write_fills_from_the_start() {
    let (native, device) = setup(32);
    let texture = Texture3DBuilder::<u8>::new(2, 2, 2)
        .with_usage(Usage::DiscardWrite)
        .create(&device)
        .unwrap();
    texture.discard_write(&[1, 2, 3, 4, 5, 6], 0).unwrap();
    assert_eq!(
        native.subresource_contents(texture.id(), 0).unwrap(),
        [1, 2, 3, 4, 5, 6, 0, 0]
    );
    texture.dispose().unwrap();
}

#[test]
fn one_dimensional_offsets() {
    let (_, device) = setup(1);
    let texture = Texture1DBuilder::<u32>::new(8)
        .with_usage(Usage::StagingReadWrite)
        .with_bindings(GpuBindings::NONE)
        .with_mipmaps(true)
        .create(&device)
        .unwrap();
    assert_eq!(texture.num_mips(), 4);
    texture.write(&[5, 6], 1, 2).unwrap();
    assert_eq!(&*texture.read(1).unwrap(), &[0, 0, 5, 6]);
    assert!(matches!(texture.write(&[1], 3, 1), Err(Error::Bounds(_))));
    assert!(matches!(texture.read(4), Err(Error::Bounds(_))));
    texture.dispose().unwrap();
}

#[test]
fn read_all_orders_mips_then_rows() {
    let (_, device) = setup(4);
    let texture = Texture2DBuilder::<u8>::new(2, 2)
        .with_usage(Usage::StagingReadWrite)
        .with_bindings(GpuBindings::NONE)
        .with_mipmaps(true)
        .create(&device)
        .unwrap();
    texture
        .write(&[1, 2, 3, 4], 0, SubresourceBox::area(0, 2, 0, 2))
        .unwrap();
    texture.write(&[9], 1, SubresourceBox::area(0, 1, 0, 1)).unwrap();
    assert_eq!(texture.read_all().unwrap(), [1, 2, 3, 4, 9]);
    texture.dispose().unwrap();
}

#[test]
fn initial_data_fills_every_mip() {
    let (native, device) = setup(1);
    let texture = Texture2DBuilder::<u8>::new(2, 2)
        .with_mipmaps(true)
        .with_initial_data(vec![1, 2, 3, 4, 5])
        .create(&device)
        .unwrap();
    assert_eq!(texture.subresource_index(1).unwrap(), 1);
    assert_eq!(native.subresource_contents(texture.id(), 1).unwrap(), [5]);
    assert!(!texture.can_read());
    texture.dispose().unwrap();
}

#[test]
fn texture_copies() {
    let (_, device) = setup(1);
    let source = Texture2DBuilder::<u8>::new(4, 4)
        .with_initial_data((0..16).collect::<Vec<u8>>())
        .create(&device)
        .unwrap();
    let whole = Texture2DBuilder::<u8>::new(4, 4)
        .with_usage(Usage::StagingRead)
        .with_bindings(GpuBindings::NONE)
        .create(&device)
        .unwrap();
    source.copy_to(&whole).unwrap();
    assert_eq!(whole.read_all().unwrap(), (0..16).collect::<Vec<u8>>());

    let corner = Texture2DBuilder::<u8>::new(4, 4)
        .with_usage(Usage::StagingRead)
        .with_bindings(GpuBindings::NONE)
        .create(&device)
        .unwrap();
    source
        .copy_region_to(&corner, SubresourceBox::area(2, 4, 2, 4), 0, 0, 0, 0, 0)
        .unwrap();
    let read = corner.read(0).unwrap();
    assert_eq!(&(*read)[..8], &[10, 11, 0, 0, 14, 15, 0, 0]);
    assert!(matches!(
        source.copy_region_to(&corner, SubresourceBox::area(0, 2, 0, 2), 0, 0, 3, 3, 0),
        Err(Error::Bounds(_))
    ));
    for t in [&source, &whole, &corner] {
        t.dispose().unwrap();
    }
}

#[test]
fn array_members_copy_mip_by_mip() {
    let (native, device) = setup(1);
    let array = Texture2DBuilder::<u8>::new(4, 4)
        .with_usage(Usage::Write)
        .with_mipmaps(true)
        .create_array(&device, 2)
        .unwrap();
    array[0]
        .write(&(0..16).collect::<Vec<u8>>(), 0, SubresourceBox::area(0, 4, 0, 4))
        .unwrap();
    array[0]
        .write(&[20, 21, 22, 23], 1, SubresourceBox::area(0, 2, 0, 2))
        .unwrap();
    array[0].write(&[30], 2, SubresourceBox::area(0, 1, 0, 1)).unwrap();
    let id = array.id();

    native.clear_calls();
    array[0].copy_to(&array[1]).unwrap();
    assert_eq!(native.count_of("copy_subresource_region"), 3);
    assert_eq!(native.count_of("copy_resource"), 0);
    for mip in 0..3 {
        assert_eq!(
            native.subresource_contents(id, 3 + mip).unwrap(),
            native.subresource_contents(id, mip).unwrap()
        );
    }
    assert!(matches!(array[1].copy_to(&array[1]), Err(Error::InvalidArgument(_))));

    let standalone = Texture2DBuilder::<u8>::new(4, 4)
        .with_usage(Usage::StagingRead)
        .with_bindings(GpuBindings::NONE)
        .with_mipmaps(true)
        .create(&device)
        .unwrap();
    array[1].copy_to(&standalone).unwrap();
    let mut expected: Vec<u8> = (0..16).collect();
    expected.extend([20, 21, 22, 23, 30]);
    assert_eq!(standalone.read_all().unwrap(), expected);
    standalone.dispose().unwrap();
    array.dispose().unwrap();
}

#[test]
fn copy_into_a_mapped_sibling_waits_for_it() {
    let (native, device) = setup(1);
    let array = Texture2DBuilder::<u8>::new(4, 4)
        .with_usage(Usage::StagingReadWrite)
        .with_bindings(GpuBindings::NONE)
        .create_array(&device, 2)
        .unwrap();
    array[0]
        .write(&[7; 16], 0, SubresourceBox::area(0, 4, 0, 4))
        .unwrap();
    let (entered, inside) = flume::bounded::<()>(1);
    std::thread::scope(|s| {
        let array = &array;
        s.spawn(move || {
            array[1]
                .read_write(0, |_view| {
                    entered.send(()).unwrap();
                    std::thread::sleep(std::time::Duration::from_millis(50));
                })
                .unwrap();
        });
        s.spawn(move || {
            inside.recv().unwrap();
            array[0].copy_to(&array[1]).unwrap();
        });
    });
    assert_eq!(native.subresource_contents(array.id(), 1).unwrap(), [7; 16]);
    array.dispose().unwrap();
}

#[test]
fn generated_mips_point_sample() {
    let (native, device) = setup(1);
    let texture = Texture2DBuilder::<u8>::new(4, 4)
        .with_usage(Usage::Write)
        .with_bindings(GpuBindings::READABLE_SHADER_RESOURCE | GpuBindings::RENDER_TARGET)
        .with_mipmaps(true)
        .with_mip_generation_target(true)
        .create(&device)
        .unwrap();
    texture
        .write(&(1..=16).collect::<Vec<u8>>(), 0, SubresourceBox::area(0, 4, 0, 4))
        .unwrap();
    texture.generate_mips().unwrap();
    assert_eq!(
        native.subresource_contents(texture.id(), 1).unwrap(),
        [1, 3, 9, 11]
    );
    assert_eq!(native.subresource_contents(texture.id(), 2).unwrap(), [1]);
    //the transient view was released
    assert_eq!(native.live_views(), 0);

    let plain = Texture2DBuilder::<u8>::new(4, 4)
        .with_usage(Usage::Write)
        .with_mipmaps(true)
        .create(&device)
        .unwrap();
    assert!(matches!(plain.generate_mips(), Err(Error::InvalidArgument(_))));
    texture.dispose().unwrap();
    plain.dispose().unwrap();
}

#[test]
fn texture_views() {
    let (native, device) = setup(1);
    let target = Texture2DBuilder::<Rgba8Unorm>::new(8, 8)
        .with_usage(Usage::Write)
        .with_bindings(
            GpuBindings::READABLE_SHADER_RESOURCE
                | GpuBindings::RENDER_TARGET
                | GpuBindings::WRITABLE_SHADER_RESOURCE,
        )
        .with_mipmaps(true)
        .create(&device)
        .unwrap();
    let srv = target.create_view(1, 3).unwrap();
    assert_eq!(srv.mip_range(), Some((1, 3)));
    let rtv = target.create_render_target_view(0).unwrap();
    let uav = target.create_unordered_access_view(2).unwrap();
    assert!(matches!(
        target.create_depth_stencil_view(0),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(target.create_view(2, 3), Err(Error::InvalidArgument(_))));
    assert_eq!(native.live_views(), 3);

    let volume = Texture3DBuilder::<f32>::new(4, 4, 4)
        .with_usage(Usage::Write)
        .with_bindings(GpuBindings::WRITABLE_SHADER_RESOURCE)
        .with_mipmaps(true)
        .create(&device)
        .unwrap();
    let slices = volume.create_unordered_access_view(1, 0, 2).unwrap();
    assert!(matches!(
        volume.create_unordered_access_view(1, 1, 2),
        Err(Error::InvalidArgument(_))
    ));

    for v in [&*srv, &*rtv, &*uav, &*slices] {
        v.dispose().unwrap();
        v.dispose().unwrap();
    }
    assert_eq!(native.live_views(), 0);
    target.dispose().unwrap();
    volume.dispose().unwrap();
}

#[test]
fn clone_builder_recreates_contents() {
    let (_, device) = setup(1);
    let original = Texture2DBuilder::<u8>::new(2, 2)
        .with_usage(Usage::StagingReadWrite)
        .with_bindings(GpuBindings::NONE)
        .create(&device)
        .unwrap();
    original
        .write(&[4, 3, 2, 1], 0, SubresourceBox::area(0, 2, 0, 2))
        .unwrap();
    let copy = original.clone_builder(true).unwrap().create(&device).unwrap();
    assert_eq!(copy.read_all().unwrap(), [4, 3, 2, 1]);
    assert_ne!(copy.id(), original.id());
    original.dispose().unwrap();
    copy.dispose().unwrap();
}
