// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! texels_and_buffers manages GPU buffers and textures on top of an immediate-mode,
Direct3D-style native device.

It sits between rendering code and the driver. It creates resources, tracks how many of each are
alive, and mediates every read, write, copy and view over their memory.

# Capabilities are declared up front

Every resource is created with a [`Usage`] and a set of [`GpuBindings`]. Together they decide,
once and for all, which operations the resource supports:

| Usage            | discard-write | write | read | read-write | copy destination |
|------------------|---------------|-------|------|------------|------------------|
| Immutable        |               |       |      |            |                  |
| DiscardWrite     | ✓             |       |      |            | ✓                |
| Write            |               | ✓     |      |            | ✓                |
| StagingRead      |               |       | ✓    |            | ✓                |
| StagingWrite     |               | ✓     |      |            | ✓                |
| StagingReadWrite |               | ✓     | ✓    | ✓          | ✓                |

An operation the usage does not allow fails with [`Error::Capability`] before the driver is
touched. Builders check usages and bindings against a fixed table per [`ResourceClass`].

# One thread owns the device context

The native context is single-threaded. A [`Device`] starts a dedicated thread ([`DeviceThread`])
and routes context work to it: reads wait for their result, staging writes are queued and
return immediately. Discard-writes and update-region writes run on the calling thread.
Resources themselves are `Send + Sync`; each serializes its own mutations.

# Lifetimes are explicit

Resources are released with [`Resource::dispose`], exactly once no matter how often it is called.
Operations on a disposed resource log a warning and do nothing. Dropping a resource without
disposing it only logs, in debug builds. [`Device::live_counts`] reports what is still alive.

```
use std::sync::Arc;
use texels_and_buffers::{BufferBuilder, Device, Resource, SoftwareDevice, Usage, GpuBindings};

let device = Device::new(Arc::new(SoftwareDevice::new()))?;
let buffer = BufferBuilder::<f32>::new()
    .with_usage(Usage::StagingReadWrite)
    .with_bindings(GpuBindings::NONE)
    .with_length(4)
    .create(&device)?;
buffer.write(&[1.0, 2.0, 3.0, 4.0], 0)?;
assert_eq!(buffer.read()?, [1.0, 2.0, 3.0, 4.0]);
buffer.dispose()?;
# Ok::<(), texels_and_buffers::Error>(())
```
*/

logwise::declare_logging_domain!();

pub mod addressing;
pub mod buffer;
pub mod capability;
mod device;
mod error;
pub mod gateway;
mod lifecycle;
mod mapping;
pub mod native;
pub mod pixel_formats;
mod registry;
pub mod texture;
pub mod view;

pub use buffer::{Buffer, BufferBuilder, BufferKind};
pub use capability::{GpuBindings, Operation, ResourceClass, Usage};
pub use device::Device;
pub use error::{Error, NativeError, Result};
pub use gateway::{DeviceConfig, DeviceThread};
pub use lifecycle::{Resource, ResourceCore};
pub use native::software::{SoftwareDevice, SoftwareDeviceConfig};
pub use native::{NativeDevice, ResourceId, ViewId};
pub use pixel_formats::{Element, ResourceFormat, Texel};
pub use registry::ResourceRegistry;
pub use texture::{
    TexelArray, TexelView, Texture1D, Texture1DArray, Texture1DBuilder, Texture2D, Texture2DArray,
    Texture2DBuilder, Texture3D, Texture3DBuilder, TextureBuilder,
};
pub use view::{
    DepthStencilView, RenderTargetView, ResourceView, ShaderResourceView, UnorderedAccessView,
};
