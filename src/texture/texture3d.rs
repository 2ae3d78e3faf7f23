// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

use crate::addressing::SubresourceBox;
use crate::error::Result;
use crate::pixel_formats::Texel;
use crate::view::UnorderedAccessView;

use super::builder::Texture3DBuilder;
use super::TextureInner;

/// A volume of texels. There are no 3D texture arrays.
pub struct Texture3D<T: Texel> {
    inner: TextureInner<T>,
}

texture_common!(Texture3D);

impl<T: Texel> Texture3D<T> {
    pub(crate) fn from_inner(inner: TextureInner<T>) -> Self {
        Texture3D { inner }
    }

    pub fn height(&self) -> u32 {
        self.inner.shape().height
    }

    pub fn depth(&self) -> u32 {
        self.inner.shape().depth
    }

    pub fn mip_height(&self, mip: u32) -> Result<u32> {
        Ok(self.inner.mip_extents(mip)?.1)
    }

    pub fn mip_depth(&self, mip: u32) -> Result<u32> {
        Ok(self.inner.mip_extents(mip)?.2)
    }

    /// Discard-writes `data` from the start of `mip`, slice by slice.
    pub fn discard_write(&self, data: &[T], mip: u32) -> Result<()> {
        self.inner.discard_write_linear(data, mip, 0)
    }

    /// Writes `data`, tightly packed by row then slice, into `region` of `mip`.
    pub fn write(&self, data: &[T], mip: u32, region: SubresourceBox) -> Result<()> {
        self.inner.write_region(data, mip, region)
    }

    /// An unordered-access view of `num_slices` depth slices of `mip`, from `first_slice`.
    pub fn create_unordered_access_view(
        &self,
        mip: u32,
        first_slice: u32,
        num_slices: u32,
    ) -> Result<UnorderedAccessView> {
        self.inner
            .create_unordered_access_view(mip, Some((first_slice, num_slices)))
    }

    pub fn clone_builder(&self, include_data: bool) -> Result<Texture3DBuilder<T>> {
        let data = if include_data {
            Some(self.inner.read_all()?)
        } else {
            None
        };
        let core = self.inner.core();
        Ok(Texture3DBuilder::from_shape(
            self.inner.shape(),
            core.usage(),
            core.bindings(),
            data,
        ))
    }
}
