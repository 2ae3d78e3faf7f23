// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

use crate::addressing::SubresourceBox;
use crate::error::{Error, Result};
use crate::pixel_formats::Texel;
use crate::view::{DepthStencilView, RenderTargetView, UnorderedAccessView};

use super::builder::Texture2DBuilder;
use super::TextureInner;

/// A 2D image, optionally mipmapped. The usual texture.
pub struct Texture2D<T: Texel> {
    inner: TextureInner<T>,
}

texture_common!(Texture2D);

impl<T: Texel> Texture2D<T> {
    pub(crate) fn from_inner(inner: TextureInner<T>) -> Self {
        Texture2D { inner }
    }

    pub(crate) fn inner(&self) -> &TextureInner<T> {
        &self.inner
    }

    pub fn height(&self) -> u32 {
        self.inner.shape().height
    }

    pub fn mip_height(&self, mip: u32) -> Result<u32> {
        Ok(self.inner.mip_extents(mip)?.1)
    }

    /**
    Discard-writes `data` into `mip`, starting at texel `(u, v)`.

    `data` is a run of texels in row order: it continues onto the following rows once it passes
    the end of row `v`. The driver's row pitch is honoured.
    */
    pub fn discard_write(&self, data: &[T], mip: u32, u: u32, v: u32) -> Result<()> {
        let (w, h, _) = self.inner.mip_extents(mip)?;
        if u >= w || v >= h {
            return Err(Error::Bounds(format!(
                "texel ({u}, {v}) outside mip {mip} of {w}x{h}"
            )));
        }
        self.inner
            .discard_write_linear(data, mip, v as u64 * w as u64 + u as u64)
    }

    /// Writes `data`, tightly packed by row, into `region` of `mip`.
    pub fn write(&self, data: &[T], mip: u32, region: SubresourceBox) -> Result<()> {
        self.inner.write_region(data, mip, region)
    }

    pub fn create_unordered_access_view(&self, mip: u32) -> Result<UnorderedAccessView> {
        self.inner.create_unordered_access_view(mip, None)
    }

    /// Requires the `RENDER_TARGET` binding.
    pub fn create_render_target_view(&self, mip: u32) -> Result<RenderTargetView> {
        self.inner.create_render_target_view(mip)
    }

    /// Requires the `DEPTH_STENCIL_TARGET` binding.
    pub fn create_depth_stencil_view(&self, mip: u32) -> Result<DepthStencilView> {
        self.inner.create_depth_stencil_view(mip)
    }

    /**
    A builder that recreates this texture.

    With `include_data` every mip is read back as initial data, which requires a readable usage.
    */
    pub fn clone_builder(&self, include_data: bool) -> Result<Texture2DBuilder<T>> {
        let data = if include_data {
            Some(self.inner.read_all()?)
        } else {
            None
        };
        let core = self.inner.core();
        Ok(Texture2DBuilder::from_shape(
            self.inner.shape(),
            core.usage(),
            core.bindings(),
            data,
        ))
    }
}
