// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The native driver surface.

[`NativeDevice`] is the C-style call surface of an immediate-mode, Direct3D-style device and
context pair. Everything above this module is written against the trait; [`software::SoftwareDevice`]
is an in-memory implementation used for headless operation and tests.

Calls on the trait fall into two groups. Device calls (`create_*`, `release_*`) are free-threaded.
Context calls (map, unmap, update, copy, view creation, mip generation) are issued by this crate
only under the discipline described in [`crate::gateway`].
*/

pub mod software;

use std::fmt::Display;

use crate::addressing::SubresourceBox;
use crate::capability::{GpuBindings, Usage};
use crate::error::NativeError;
use crate::pixel_formats::ResourceFormat;

/// Opaque handle to one native resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub const NULL: ResourceId = ResourceId(0);

    pub const fn from_raw(raw: u64) -> Self {
        ResourceId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Opaque handle to one native view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    pub const NULL: ViewId = ViewId(0);

    pub const fn from_raw(raw: u64) -> Self {
        ViewId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// How a subresource is mapped into CPU memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapMode {
    Read,
    Write,
    ReadWrite,
    /// Previous contents are invalidated.
    WriteDiscard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D3,
}

/// Parameters for [`NativeDevice::create_buffer`].
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub element_size: u32,
    pub length: u32,
    pub usage: Usage,
    pub bindings: GpuBindings,
    pub format: ResourceFormat,
    /// Structured buffers have [`ResourceFormat::Unknown`] elements.
    pub structured: bool,
    pub allow_raw_access: bool,
    pub initial_data: Option<&'a [u8]>,
}

/**
Parameters for [`NativeDevice::create_texture`].

`initial_data`, when present, holds every subresource tightly packed, array elements outermost
and mips within each element, smallest mip index first.
*/
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub dimension: TextureDimension,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    pub mip_levels: u32,
    pub texel_size: u32,
    pub format: ResourceFormat,
    pub usage: Usage,
    pub bindings: GpuBindings,
    pub mip_generation_target: bool,
    pub multisampled: bool,
    pub initial_data: Option<&'a [u8]>,
}

/// The sub-range a view exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRange {
    Elements {
        first: u32,
        count: u32,
    },
    /// For 3D unordered-access views the array range selects depth slices.
    Texture {
        first_mip: u32,
        num_mips: u32,
        first_array: u32,
        array_count: u32,
        is_array: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    ShaderResource,
    UnorderedAccess {
        append_consume: bool,
        include_counter: bool,
        raw: bool,
    },
    RenderTarget,
    DepthStencil,
}

impl Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ViewKind::ShaderResource => "shader resource view",
            ViewKind::UnorderedAccess { .. } => "unordered access view",
            ViewKind::RenderTarget => "render target view",
            ViewKind::DepthStencil => "depth stencil view",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewDesc {
    pub kind: ViewKind,
    pub format: ResourceFormat,
    pub range: ViewRange,
}

/**
A mapped subresource.

`data` points at `len` bytes of driver memory. Rows are `row_pitch` bytes apart and slices
`depth_pitch` bytes apart; both may exceed the tightly packed size.
*/
#[derive(Debug)]
pub struct MappedSubresource {
    pub data: *mut u8,
    pub len: usize,
    pub row_pitch: usize,
    pub depth_pitch: usize,
}

// Mapped driver memory is not tied to the thread that mapped it.
unsafe impl Send for MappedSubresource {}

/**
The native driver call surface.

# Safety

A successful [`map_subresource`](Self::map_subresource) must return a pointer valid for reads and
writes of `len` bytes, from any thread, until the matching
[`unmap_subresource`](Self::unmap_subresource). The memory must not be aliased by any other live
mapping, and `len` must cover `depth_pitch * (slices - 1) + row_pitch * (rows - 1) + row_bytes`
for the subresource's extents.
*/
pub unsafe trait NativeDevice: Send + Sync + 'static {
    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<ResourceId, NativeError>;

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<ResourceId, NativeError>;

    fn map_subresource(
        &self,
        resource: ResourceId,
        subresource: u32,
        mode: MapMode,
    ) -> Result<MappedSubresource, NativeError>;

    fn unmap_subresource(&self, resource: ResourceId, subresource: u32) -> Result<(), NativeError>;

    /// Writes `data`, laid out with the given pitches, into `region` of the subresource.
    fn update_subresource_region(
        &self,
        resource: ResourceId,
        subresource: u32,
        region: &SubresourceBox,
        data: &[u8],
        row_pitch: usize,
        depth_pitch: usize,
    ) -> Result<(), NativeError>;

    fn copy_resource(&self, source: ResourceId, destination: ResourceId) -> Result<(), NativeError>;

    /// Copies `region` of one subresource to `(dst_x, dst_y, dst_z)` of another.
    ///
    /// Buffer regions are measured in bytes.
    #[allow(clippy::too_many_arguments)]
    fn copy_subresource_region(
        &self,
        source: ResourceId,
        source_subresource: u32,
        region: &SubresourceBox,
        destination: ResourceId,
        destination_subresource: u32,
        dst_x: u32,
        dst_y: u32,
        dst_z: u32,
    ) -> Result<(), NativeError>;

    fn release_resource(&self, resource: ResourceId) -> Result<(), NativeError>;

    fn create_view(&self, resource: ResourceId, desc: &ViewDesc) -> Result<ViewId, NativeError>;

    fn release_view(&self, view: ViewId) -> Result<(), NativeError>;

    /// Fills every mip in the view's range from the level above it.
    fn generate_mips(&self, view: ViewId) -> Result<(), NativeError>;
}

impl std::fmt::Debug for dyn NativeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NativeDevice")
    }
}
