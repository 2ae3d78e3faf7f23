// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Texel containers handed to and returned from texture access methods.

use std::marker::PhantomData;
use std::ops::{Deref, Index};

use crate::error::{Error, NativeResultExt, Result};
use crate::mapping::{copy_from_pitched, MappedSubresourceGuard, PitchedRegion, Route};
use crate::native::{MapMode, NativeDevice, ResourceId, ViewId};
use crate::pixel_formats::Texel;

/**
One mip read back from a texture, tightly packed.

Texels are stored row-major: `x` fastest, then `y`, then `z`.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct TexelArray<T> {
    data: Vec<T>,
    width: u32,
    height: u32,
    depth: u32,
}

impl<T: Texel> TexelArray<T> {
    pub(crate) fn new(data: Vec<T>, width: u32, height: u32, depth: u32) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * depth as usize);
        TexelArray {
            data,
            width,
            height,
            depth,
        }
    }

    pub(crate) fn zeroed(width: u32, height: u32, depth: u32) -> Self {
        let len = width as usize * height as usize * depth as usize;
        Self::new(vec![bytemuck::Zeroable::zeroed(); len], width, height, depth)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The texel at `(x, y, z)`, or `None` outside the mip.
    pub fn get(&self, x: u32, y: u32, z: u32) -> Option<&T> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return None;
        }
        let i = (z as usize * self.height as usize + y as usize) * self.width as usize + x as usize;
        self.data.get(i)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Deref for TexelArray<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<(u32, u32)> for TexelArray<T> {
    type Output = T;
    /// Indexes `(x, y)` in the first slice.
    fn index(&self, (x, y): (u32, u32)) -> &T {
        assert!(x < self.width && y < self.height, "texel ({x}, {y}) out of range");
        &self.data[y as usize * self.width as usize + x as usize]
    }
}

/**
A mapped mip, for in-place edits.

The underlying memory may be padded: rows are [`row_pitch`](Self::row_pitch) bytes apart and
slices [`depth_pitch`](Self::depth_pitch) bytes apart. [`get`](Self::get) and [`set`](Self::set)
account for that; [`bytes_mut`](Self::bytes_mut) exposes the raw layout.
*/
pub struct TexelView<'a, T> {
    bytes: &'a mut [u8],
    width: u32,
    height: u32,
    depth: u32,
    row_pitch: usize,
    depth_pitch: usize,
    _texel: PhantomData<T>,
}

impl<'a, T: Texel> TexelView<'a, T> {
    pub(crate) fn new(
        bytes: &'a mut [u8],
        (width, height, depth): (u32, u32, u32),
        row_pitch: usize,
        depth_pitch: usize,
    ) -> Self {
        TexelView {
            bytes,
            width,
            height,
            depth,
            row_pitch,
            depth_pitch,
            _texel: PhantomData,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    pub fn depth_pitch(&self) -> usize {
        self.depth_pitch
    }

    fn offset(&self, x: u32, y: u32, z: u32) -> Result<usize> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return Err(Error::Bounds(format!(
                "texel ({x}, {y}, {z}) outside {}x{}x{}",
                self.width, self.height, self.depth
            )));
        }
        Ok(z as usize * self.depth_pitch + y as usize * self.row_pitch + x as usize * T::SIZE)
    }

    pub fn get(&self, x: u32, y: u32, z: u32) -> Result<T> {
        let at = self.offset(x, y, z)?;
        Ok(bytemuck::pod_read_unaligned(&self.bytes[at..at + T::SIZE]))
    }

    pub fn set(&mut self, x: u32, y: u32, z: u32, texel: T) -> Result<()> {
        let at = self.offset(x, y, z)?;
        self.bytes[at..at + T::SIZE].copy_from_slice(bytemuck::bytes_of(&texel));
        Ok(())
    }

    /// Applies `f` to every texel.
    pub fn update_each(&mut self, mut f: impl FnMut(u32, u32, u32, T) -> T) {
        for z in 0..self.depth {
            for y in 0..self.height {
                for x in 0..self.width {
                    let at = z as usize * self.depth_pitch
                        + y as usize * self.row_pitch
                        + x as usize * T::SIZE;
                    let old = bytemuck::pod_read_unaligned(&self.bytes[at..at + T::SIZE]);
                    let new = f(x, y, z, old);
                    self.bytes[at..at + T::SIZE].copy_from_slice(bytemuck::bytes_of(&new));
                }
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &*self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }
}

/**
Copies `src`, a run of tightly packed texels, into pitched `dst` starting at linear texel `start`.

The run wraps from row to row and slice to slice as a tightly packed copy would.
*/
#[allow(clippy::too_many_arguments)]
pub(crate) fn copy_linear_into_pitched(
    dst: &mut [u8],
    row_pitch: usize,
    depth_pitch: usize,
    width: u32,
    height: u32,
    texel_size: usize,
    start: usize,
    src: &[u8],
) {
    let width = width as usize;
    let row_bytes = width * texel_size;
    let slice_texels = width * height as usize;
    if row_pitch == row_bytes && depth_pitch == row_bytes * height as usize {
        let at = start * texel_size;
        dst[at..at + src.len()].copy_from_slice(src);
        return;
    }
    let mut texel = start;
    let mut from = 0;
    while from < src.len() {
        let z = texel / slice_texels;
        let y = (texel % slice_texels) / width;
        let x = texel % width;
        let run = ((width - x) * texel_size).min(src.len() - from);
        let to = z * depth_pitch + y * row_pitch + x * texel_size;
        dst[to..to + run].copy_from_slice(&src[from..from + run]);
        from += run;
        texel += run / texel_size;
    }
}

/// Maps each `(subresource, region)` for reading in turn and appends its texels to one buffer.
pub(crate) fn read_subresources(
    native: &dyn NativeDevice,
    resource: ResourceId,
    subresources: &[(u32, PitchedRegion)],
) -> Result<Vec<u8>> {
    let total: usize = subresources.iter().map(|(_, r)| r.tight_len()).sum();
    let mut out = Vec::with_capacity(total);
    for (subresource, region) in subresources {
        let mapping =
            MappedSubresourceGuard::map(Route::Inline(native), resource, *subresource, MapMode::Read)?;
        copy_from_pitched(
            mapping.bytes(),
            mapping.row_pitch(),
            mapping.depth_pitch(),
            region,
            &mut out,
        );
        mapping.unmap()?;
    }
    Ok(out)
}

/// Releases a transient view, reporting `first` in preference to any release failure.
pub(crate) fn finish_with_view(
    native: &dyn NativeDevice,
    view: ViewId,
    first: Result<()>,
) -> Result<()> {
    let released = native.release_view(view).native("release_view");
    first.and(released)
}
