// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

use crate::addressing::SubresourceBox;
use crate::error::{Error, Result};
use crate::pixel_formats::Texel;
use crate::view::UnorderedAccessView;

use super::builder::Texture1DBuilder;
use super::TextureInner;

/// A row of texels, optionally mipmapped.
pub struct Texture1D<T: Texel> {
    inner: TextureInner<T>,
}

texture_common!(Texture1D);

impl<T: Texel> Texture1D<T> {
    pub(crate) fn from_inner(inner: TextureInner<T>) -> Self {
        Texture1D { inner }
    }

    pub(crate) fn inner(&self) -> &TextureInner<T> {
        &self.inner
    }

    /// Discard-writes `data` into `mip` starting at texel `offset_x`.
    pub fn discard_write(&self, data: &[T], mip: u32, offset_x: u32) -> Result<()> {
        self.inner.discard_write_linear(data, mip, offset_x as u64)
    }

    /// Writes `data` into `mip` starting at texel `offset_x`.
    pub fn write(&self, data: &[T], mip: u32, offset_x: u32) -> Result<()> {
        let len = u32::try_from(data.len()).map_err(|_| {
            Error::Bounds(format!("{} texels do not fit a 1D texture", data.len()))
        })?;
        let right = offset_x
            .checked_add(len)
            .ok_or_else(|| Error::Bounds(format!("offset {offset_x} + {len} overflows")))?;
        self.inner.write_region(data, mip, SubresourceBox::span(offset_x, right))
    }

    pub fn create_unordered_access_view(&self, mip: u32) -> Result<UnorderedAccessView> {
        self.inner.create_unordered_access_view(mip, None)
    }

    /**
    A builder that recreates this texture.

    With `include_data` every mip is read back as initial data, which requires a readable usage.
    */
    pub fn clone_builder(&self, include_data: bool) -> Result<Texture1DBuilder<T>> {
        let data = if include_data {
            Some(self.inner.read_all()?)
        } else {
            None
        };
        let core = self.inner.core();
        Ok(Texture1DBuilder::from_shape(
            self.inner.shape(),
            core.usage(),
            core.bindings(),
            data,
        ))
    }
}
