// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Textures of typed texels.

[`Texture1D`], [`Texture2D`] and [`Texture3D`] are thin, dimension-specific fronts over one shared
implementation. They are created from a [`TextureBuilder`]; 1D and 2D builders can also create
arrays ([`Texture1DArray`], [`Texture2DArray`]) whose members are ordinary textures that address
their own slice of the shared native resource.

Access follows the same usage rules as buffers, per mip:

* `discard_write` maps the mip write-discard on the calling thread;
* `write` uses the driver's update-region call for `Write` usage, otherwise queues a map-write on
  the device thread;
* `read`, `read_all` and `read_write` map on the device thread and wait.

Copies in and out of mapped memory honour the driver's row and depth pitch. When those match the
tightly packed layout the whole mip moves in one copy.
*/

#[macro_use]
mod common;
mod access;
mod array;
mod builder;
mod texture1d;
mod texture2d;
mod texture3d;

pub use access::{TexelArray, TexelView};
pub use array::{Texture1DArray, Texture2DArray};
pub use builder::{
    Dimension, Texture1DBuilder, Texture2DBuilder, Texture3DBuilder, TextureBuilder, D1, D2, D3,
};
pub use texture1d::Texture1D;
pub use texture2d::Texture2D;
pub use texture3d::Texture3D;

use std::marker::PhantomData;
use std::sync::Arc;

use crate::addressing::{
    array_subresource_index, check_mip, mip_dimension, subresource_index, texels_in_chain,
    SubresourceBox,
};
use crate::capability::Operation;
use crate::error::{Error, NativeResultExt, Result};
use crate::lifecycle::{Access, ResourceCore};
use crate::mapping::{copy_into_pitched, MappedSubresourceGuard, PitchedRegion, Route};
use crate::native::{MapMode, TextureDimension, ViewDesc, ViewKind, ViewRange};
use crate::pixel_formats::{elements_as_bytes, elements_from_bytes, Texel};
use crate::view::{
    check_range, DepthStencilView, RenderTargetView, ResourceView, ShaderResourceView,
    UnorderedAccessView,
};

use access::{copy_linear_into_pitched, finish_with_view, read_subresources};

/// Creation-time facts about a texture, shared by a standalone texture and every array member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextureShape {
    pub dimension: TextureDimension,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub num_mips: u32,
    pub mipmapped: bool,
    pub mip_generation_target: bool,
    pub dynamic_detail_target: bool,
    pub multisampled: bool,
}

impl TextureShape {
    pub(crate) fn mip_extents(&self, mip: u32) -> (u32, u32, u32) {
        (
            mip_dimension(self.width, mip),
            mip_dimension(self.height, mip),
            mip_dimension(self.depth, mip),
        )
    }

    pub(crate) fn texels_in_chain(&self) -> u64 {
        texels_in_chain(self.width, self.height, self.depth, self.num_mips)
    }
}

/// The implementation behind every texture type.
pub(crate) struct TextureInner<T: Texel> {
    core: ResourceCore,
    shape: TextureShape,
    array_index: u32,
    //1 for standalone textures
    array_length: u32,
    _texel: PhantomData<fn() -> T>,
}

impl<T: Texel> TextureInner<T> {
    pub(crate) fn new(
        core: ResourceCore,
        shape: TextureShape,
        array_index: u32,
        array_length: u32,
    ) -> Self {
        TextureInner {
            core,
            shape,
            array_index,
            array_length,
            _texel: PhantomData,
        }
    }

    pub(crate) fn core(&self) -> &ResourceCore {
        &self.core
    }

    pub(crate) fn shape(&self) -> &TextureShape {
        &self.shape
    }

    pub(crate) fn array_index(&self) -> u32 {
        self.array_index
    }

    pub(crate) fn subresource(&self, mip: u32) -> Result<u32> {
        if self.core.is_array_member() {
            array_subresource_index(mip, self.shape.num_mips, self.array_index, self.array_length)
        } else {
            subresource_index(mip, self.shape.num_mips)
        }
    }

    pub(crate) fn mip_extents(&self, mip: u32) -> Result<(u32, u32, u32)> {
        check_mip(mip, self.shape.num_mips)?;
        Ok(self.shape.mip_extents(mip))
    }

    fn whole_mip(&self, mip: u32) -> PitchedRegion {
        let (w, h, d) = self.shape.mip_extents(mip);
        PitchedRegion::whole(w as usize * T::SIZE, h as usize, d as usize)
    }

    /**
    Discard-writes `data` into `mip`, starting at linear texel `start`.

    The run of texels wraps across rows and slices.
    */
    pub(crate) fn discard_write_linear(&self, data: &[T], mip: u32, start: u64) -> Result<()> {
        self.core.check(Operation::DiscardWrite)?;
        let subresource = self.subresource(mip)?;
        let (w, h, d) = self.shape.mip_extents(mip);
        let texels = w as u64 * h as u64 * d as u64;
        if start + data.len() as u64 > texels {
            return Err(Error::Bounds(format!(
                "{} texels at offset {start} exceed mip {mip} of {texels} texels",
                data.len()
            )));
        }
        if data.is_empty() {
            return Ok(());
        }
        let bytes = elements_as_bytes(data);
        self.core.mutate(Access::Write, || {
            let device = self.core.device();
            let mut mapping = MappedSubresourceGuard::map(
                Route::Inline(device.native()),
                self.core.id(),
                subresource,
                MapMode::WriteDiscard,
            )?;
            let (row_pitch, depth_pitch) = (mapping.row_pitch(), mapping.depth_pitch());
            copy_linear_into_pitched(
                mapping.bytes_mut(),
                row_pitch,
                depth_pitch,
                w,
                h,
                T::SIZE,
                start as usize,
                bytes,
            );
            mapping.unmap()
        })?;
        Ok(())
    }

    /// Writes `data`, tightly packed, into `region` of `mip`.
    pub(crate) fn write_region(&self, data: &[T], mip: u32, region: SubresourceBox) -> Result<()> {
        self.core.check(Operation::Write)?;
        let subresource = self.subresource(mip)?;
        let (w, h, d) = self.shape.mip_extents(mip);
        region.check_within(w, h, d)?;
        if data.len() as u64 != region.volume() {
            return Err(Error::Bounds(format!(
                "{} texels supplied for a region of {}",
                data.len(),
                region.volume()
            )));
        }
        if data.is_empty() {
            return Ok(());
        }
        let bytes = elements_as_bytes(data);
        let row_bytes = region.width() as usize * T::SIZE;
        let slice_bytes = row_bytes * region.height() as usize;
        let id = self.core.id();
        self.core.mutate(Access::Write, || {
            let device = self.core.device();
            if self.core.usage().should_update_subresource_region() {
                device
                    .native()
                    .update_subresource_region(id, subresource, &region, bytes, row_bytes, slice_bytes)
                    .native("update_subresource_region")
            } else {
                let owned = bytes.to_vec();
                let target = PitchedRegion {
                    x_bytes: region.left as usize * T::SIZE,
                    y: region.top as usize,
                    z: region.front as usize,
                    row_bytes,
                    rows: region.height() as usize,
                    slices: region.depth() as usize,
                };
                device.gateway().run_async("texture write", move |native| {
                    let mut mapping = MappedSubresourceGuard::map(
                        Route::Inline(native),
                        id,
                        subresource,
                        MapMode::Write,
                    )?;
                    let (row_pitch, depth_pitch) = (mapping.row_pitch(), mapping.depth_pitch());
                    copy_into_pitched(mapping.bytes_mut(), row_pitch, depth_pitch, &target, &owned);
                    mapping.unmap()
                })
            }
        })?;
        Ok(())
    }

    /// Reads one mip. A disposed texture reads as zeroes.
    pub(crate) fn read(&self, mip: u32) -> Result<TexelArray<T>> {
        self.core.check(Operation::Read)?;
        let subresource = self.subresource(mip)?;
        let (w, h, d) = self.shape.mip_extents(mip);
        let Some(_guard) = self.core.lock_live(Access::Read) else {
            return Ok(TexelArray::zeroed(w, h, d));
        };
        let id = self.core.id();
        let wanted = [(subresource, self.whole_mip(mip))];
        let bytes = self
            .core
            .device()
            .gateway()
            .run_blocking(move |native| read_subresources(native, id, &wanted))??;
        Ok(TexelArray::new(elements_from_bytes(&bytes), w, h, d))
    }

    /// Every mip, smallest index first, each by slice then row.
    pub(crate) fn read_all(&self) -> Result<Vec<T>> {
        self.core.check(Operation::Read)?;
        let wanted = (0..self.shape.num_mips)
            .map(|mip| Ok((self.subresource(mip)?, self.whole_mip(mip))))
            .collect::<Result<Vec<_>>>()?;
        let Some(_guard) = self.core.lock_live(Access::Read) else {
            let texels = self.shape.texels_in_chain() as usize;
            return Ok(vec![bytemuck::Zeroable::zeroed(); texels]);
        };
        let id = self.core.id();
        let bytes = self
            .core
            .device()
            .gateway()
            .run_blocking(move |native| read_subresources(native, id, &wanted))??;
        Ok(elements_from_bytes(&bytes))
    }

    /// Maps `mip` for reading and writing and hands it to `f` on the calling thread.
    pub(crate) fn read_write(&self, mip: u32, f: impl FnOnce(TexelView<'_, T>)) -> Result<()> {
        self.core.check(Operation::ReadWrite)?;
        let subresource = self.subresource(mip)?;
        let extents = self.shape.mip_extents(mip);
        self.core.mutate(Access::Write, || {
            let mut mapping = MappedSubresourceGuard::map(
                Route::DeviceThread(self.core.device().gateway()),
                self.core.id(),
                subresource,
                MapMode::ReadWrite,
            )?;
            let (row_pitch, depth_pitch) = (mapping.row_pitch(), mapping.depth_pitch());
            f(TexelView::new(
                mapping.bytes_mut(),
                extents,
                row_pitch,
                depth_pitch,
            ));
            mapping.unmap()
        })?;
        Ok(())
    }

    fn check_copy_target(&self, dest: &TextureInner<T>) -> Result<()> {
        if !Arc::ptr_eq(self.core.device(), dest.core.device()) {
            return Err(Error::InvalidArgument(
                "Can not copy between textures of different devices.".to_string(),
            ));
        }
        dest.core.check(Operation::CopyDestination)
    }

    /// Copies every mip into `dest`, which must have the same shape.
    pub(crate) fn copy_to(&self, dest: &TextureInner<T>) -> Result<()> {
        if self.core.id() == dest.core.id() && self.array_index == dest.array_index {
            return Err(Error::InvalidArgument(
                "Can not copy a texture onto itself.".to_string(),
            ));
        }
        let (a, b) = (&self.shape, &dest.shape);
        if a.dimension != b.dimension
            || (a.width, a.height, a.depth, a.num_mips) != (b.width, b.height, b.depth, b.num_mips)
        {
            return Err(Error::InvalidArgument(format!(
                "Can not copy {} to {}: dimensions or mip counts differ.",
                self.core, dest.core
            )));
        }
        self.check_copy_target(dest)?;
        let Some(_guards) = self.core.lock_pair(&dest.core) else {
            return Ok(());
        };
        let (source, destination) = (self.core.id(), dest.core.id());
        let gateway = self.core.device().gateway();
        if !self.core.is_array_member() && !dest.core.is_array_member() {
            return gateway
                .run_blocking(move |native| native.copy_resource(source, destination))?
                .native("copy_resource");
        }
        //array members share a native resource, so copy their subresources one by one
        let pairs = (0..a.num_mips)
            .map(|mip| {
                let (w, h, d) = a.mip_extents(mip);
                Ok((
                    self.subresource(mip)?,
                    dest.subresource(mip)?,
                    SubresourceBox::volume_of(0, w, 0, h, 0, d),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        gateway.run_blocking(move |native| -> Result<()> {
            for (src_sub, dst_sub, region) in &pairs {
                native
                    .copy_subresource_region(source, *src_sub, region, destination, *dst_sub, 0, 0, 0)
                    .native("copy_subresource_region")?;
            }
            Ok(())
        })?
    }

    /// Copies `region` of `src_mip` into `dest`'s `dst_mip` at `(x, y, z)`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn copy_region_to(
        &self,
        dest: &TextureInner<T>,
        region: SubresourceBox,
        src_mip: u32,
        dst_mip: u32,
        x: u32,
        y: u32,
        z: u32,
    ) -> Result<()> {
        let src_sub = self.subresource(src_mip)?;
        let dst_sub = dest.subresource(dst_mip)?;
        let (w, h, d) = self.shape.mip_extents(src_mip);
        region.check_within(w, h, d)?;
        let target = match (
            x.checked_add(region.width()),
            y.checked_add(region.height()),
            z.checked_add(region.depth()),
        ) {
            (Some(right), Some(bottom), Some(back)) => {
                SubresourceBox::volume_of(x, right, y, bottom, z, back)
            }
            _ => return Err(Error::Bounds(format!("destination offset ({x}, {y}, {z}) overflows"))),
        };
        let (dw, dh, dd) = dest.shape.mip_extents(dst_mip);
        target.check_within(dw, dh, dd)?;
        if self.core.id() == dest.core.id() && src_sub == dst_sub {
            return Err(Error::InvalidArgument(
                "Can not copy a region of a subresource onto itself.".to_string(),
            ));
        }
        self.check_copy_target(dest)?;
        if region.volume() == 0 {
            return Ok(());
        }
        let Some(_guards) = self.core.lock_pair(&dest.core) else {
            return Ok(());
        };
        let (source, destination) = (self.core.id(), dest.core.id());
        self.core
            .device()
            .gateway()
            .run_blocking(move |native| {
                native.copy_subresource_region(source, src_sub, &region, destination, dst_sub, x, y, z)
            })?
            .native("copy_subresource_region")
    }

    fn range(&self, first_mip: u32, num_mips: u32) -> ViewRange {
        ViewRange::Texture {
            first_mip,
            num_mips,
            first_array: self.array_index,
            array_count: 1,
            is_array: self.core.is_array_member(),
        }
    }

    pub(crate) fn create_view(&self, first_mip: u32, num_mips: u32) -> Result<ShaderResourceView> {
        check_range("mip", first_mip, num_mips, self.shape.num_mips)?;
        ResourceView::create(
            &self.core,
            ViewKind::ShaderResource,
            T::FORMAT,
            self.range(first_mip, num_mips),
        )
        .map(ShaderResourceView)
    }

    /// An unordered-access view of one mip. `slices` selects depth slices on 3D textures.
    pub(crate) fn create_unordered_access_view(
        &self,
        mip: u32,
        slices: Option<(u32, u32)>,
    ) -> Result<UnorderedAccessView> {
        check_mip(mip, self.shape.num_mips)?;
        let range = match slices {
            Some((first_slice, num_slices)) => {
                let (_, _, depth) = self.shape.mip_extents(mip);
                check_range("depth slice", first_slice, num_slices, depth)?;
                ViewRange::Texture {
                    first_mip: mip,
                    num_mips: 1,
                    first_array: first_slice,
                    array_count: num_slices,
                    is_array: false,
                }
            }
            None => self.range(mip, 1),
        };
        ResourceView::create(
            &self.core,
            ViewKind::UnorderedAccess {
                append_consume: false,
                include_counter: false,
                raw: false,
            },
            T::FORMAT,
            range,
        )
        .map(UnorderedAccessView)
    }

    pub(crate) fn create_render_target_view(&self, mip: u32) -> Result<RenderTargetView> {
        check_mip(mip, self.shape.num_mips)?;
        ResourceView::create(&self.core, ViewKind::RenderTarget, T::FORMAT, self.range(mip, 1))
            .map(RenderTargetView)
    }

    pub(crate) fn create_depth_stencil_view(&self, mip: u32) -> Result<DepthStencilView> {
        check_mip(mip, self.shape.num_mips)?;
        ResourceView::create(&self.core, ViewKind::DepthStencil, T::FORMAT, self.range(mip, 1))
            .map(DepthStencilView)
    }

    pub(crate) fn generate_mips(&self) -> Result<()> {
        generate_mips_over::<T>(&self.core, &self.shape, self.range(0, self.shape.num_mips))
    }
}

/**
Regenerates every mip below the first of `range` through a transient shader-resource view.

Shared by standalone textures, array members and whole arrays.
*/
pub(crate) fn generate_mips_over<T: Texel>(
    core: &ResourceCore,
    shape: &TextureShape,
    range: ViewRange,
) -> Result<()> {
    if !shape.mip_generation_target {
        return Err(Error::InvalidArgument(format!(
            "Can not generate mips for {core}: it was not created as a mip generation target."
        )));
    }
    let Some(_guard) = core.lock_live(Access::Write) else {
        return Ok(());
    };
    let id = core.id();
    let desc = ViewDesc {
        kind: ViewKind::ShaderResource,
        format: T::FORMAT,
        range,
    };
    core.device()
        .gateway()
        .run_blocking(move |native| -> Result<()> {
            let view = native.create_view(id, &desc).native("create_view")?;
            let generated = native.generate_mips(view).native("generate_mips");
            finish_with_view(native, view, generated)
        })?
}

impl<T: Texel> std::fmt::Debug for TextureInner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("core", &self.core)
            .field("shape", &self.shape)
            .field("array_index", &self.array_index)
            .finish()
    }
}

impl<T: Texel> std::fmt::Display for TextureInner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.shape;
        write!(f, "{} ({}", self.core, s.width)?;
        if s.dimension != TextureDimension::D1 {
            write!(f, "x{}", s.height)?;
        }
        if s.dimension == TextureDimension::D3 {
            write!(f, "x{}", s.depth)?;
        }
        write!(f, ", {} mips", s.num_mips)?;
        if self.core.is_array_member() {
            write!(f, ", element {}", self.array_index)?;
        }
        f.write_str(")")
    }
}
