// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Scoped access to mapped driver memory, and the pitched copies used to move bytes in and out of it.

A [`MappedSubresourceGuard`] is the only way this crate touches a mapping. It unmaps exactly once:
either explicitly through [`MappedSubresourceGuard::unmap`], which reports the driver's answer, or
on drop, which logs it. Early returns and panics between map and unmap are covered by the drop.
*/

use crate::error::{NativeResultExt, Result};
use crate::gateway::DeviceThread;
use crate::native::{MapMode, MappedSubresource, NativeDevice, ResourceId};

/// Where map and unmap calls are issued.
#[derive(Clone, Copy)]
pub(crate) enum Route<'a> {
    /// On the calling thread.
    Inline(&'a dyn NativeDevice),
    /// Marshalled to the device thread, waiting for each call.
    DeviceThread(&'a DeviceThread),
}

impl Route<'_> {
    fn map(&self, resource: ResourceId, subresource: u32, mode: MapMode) -> Result<MappedSubresource> {
        match self {
            Route::Inline(native) => native
                .map_subresource(resource, subresource, mode)
                .native("map_subresource"),
            Route::DeviceThread(gateway) => gateway
                .run_blocking(move |native| native.map_subresource(resource, subresource, mode))?
                .native("map_subresource"),
        }
    }

    fn unmap(&self, resource: ResourceId, subresource: u32) -> Result<()> {
        match self {
            Route::Inline(native) => native
                .unmap_subresource(resource, subresource)
                .native("unmap_subresource"),
            Route::DeviceThread(gateway) => gateway
                .run_blocking(move |native| native.unmap_subresource(resource, subresource))?
                .native("unmap_subresource"),
        }
    }
}

pub(crate) struct MappedSubresourceGuard<'a> {
    route: Route<'a>,
    resource: ResourceId,
    subresource: u32,
    mapping: MappedSubresource,
    unmapped: bool,
}

impl<'a> MappedSubresourceGuard<'a> {
    pub(crate) fn map(
        route: Route<'a>,
        resource: ResourceId,
        subresource: u32,
        mode: MapMode,
    ) -> Result<Self> {
        let mapping = route.map(resource, subresource, mode)?;
        Ok(MappedSubresourceGuard {
            route,
            resource,
            subresource,
            mapping,
            unmapped: false,
        })
    }

    pub(crate) fn row_pitch(&self) -> usize {
        self.mapping.row_pitch
    }

    pub(crate) fn depth_pitch(&self) -> usize {
        self.mapping.depth_pitch
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        if self.mapping.len == 0 {
            return &[];
        }
        // SAFETY: NativeDevice guarantees `len` valid, unaliased bytes until unmap,
        // and unmap only happens through this guard.
        unsafe { std::slice::from_raw_parts(self.mapping.data, self.mapping.len) }
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        if self.mapping.len == 0 {
            return &mut [];
        }
        // SAFETY: as in `bytes`; `&mut self` makes this the only live view.
        unsafe { std::slice::from_raw_parts_mut(self.mapping.data, self.mapping.len) }
    }

    pub(crate) fn unmap(mut self) -> Result<()> {
        self.unmapped = true;
        self.route.unmap(self.resource, self.subresource)
    }
}

impl Drop for MappedSubresourceGuard<'_> {
    fn drop(&mut self) {
        if !self.unmapped {
            if let Err(e) = self.route.unmap(self.resource, self.subresource) {
                logwise::error_sync!(
                    "could not unmap subresource {subresource} of resource {resource}: {err}",
                    subresource = self.subresource,
                    resource = logwise::privacy::LogIt(&self.resource),
                    err = logwise::privacy::LogIt(&e)
                );
            }
        }
    }
}

/**
A box of bytes inside a pitched subresource.

`x_bytes` is the byte offset within a row; `y` and `z` count rows and slices.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PitchedRegion {
    pub x_bytes: usize,
    pub y: usize,
    pub z: usize,
    pub row_bytes: usize,
    pub rows: usize,
    pub slices: usize,
}

impl PitchedRegion {
    /// A whole mip of `rows` rows and `slices` slices.
    pub(crate) fn whole(row_bytes: usize, rows: usize, slices: usize) -> Self {
        PitchedRegion {
            x_bytes: 0,
            y: 0,
            z: 0,
            row_bytes,
            rows,
            slices,
        }
    }

    pub(crate) fn tight_len(&self) -> usize {
        self.row_bytes * self.rows * self.slices
    }

    fn is_contiguous(&self, row_pitch: usize, depth_pitch: usize) -> bool {
        self.x_bytes == 0
            && self.y == 0
            && self.z == 0
            && self.row_bytes == row_pitch
            && (self.slices == 1 || self.rows * row_pitch == depth_pitch)
    }

    fn row_start(&self, row: usize, slice: usize, row_pitch: usize, depth_pitch: usize) -> usize {
        (self.z + slice) * depth_pitch + (self.y + row) * row_pitch + self.x_bytes
    }
}

/// Copies tightly packed `src` into `region` of pitched `dst`.
pub(crate) fn copy_into_pitched(
    dst: &mut [u8],
    row_pitch: usize,
    depth_pitch: usize,
    region: &PitchedRegion,
    src: &[u8],
) {
    if region.is_contiguous(row_pitch, depth_pitch) {
        let len = region.tight_len();
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }
    let mut from = 0;
    for slice in 0..region.slices {
        for row in 0..region.rows {
            let to = region.row_start(row, slice, row_pitch, depth_pitch);
            dst[to..to + region.row_bytes].copy_from_slice(&src[from..from + region.row_bytes]);
            from += region.row_bytes;
        }
    }
}

/// Appends `region` of pitched `src` to `out`, tightly packed.
pub(crate) fn copy_from_pitched(
    src: &[u8],
    row_pitch: usize,
    depth_pitch: usize,
    region: &PitchedRegion,
    out: &mut Vec<u8>,
) {
    if region.is_contiguous(row_pitch, depth_pitch) {
        out.extend_from_slice(&src[..region.tight_len()]);
        return;
    }
    out.reserve(region.tight_len());
    for slice in 0..region.slices {
        for row in 0..region.rows {
            let from = region.row_start(row, slice, row_pitch, depth_pitch);
            out.extend_from_slice(&src[from..from + region.row_bytes]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_round_trip() {
        // 3 rows of 4 bytes, padded to 8, 2 slices
        let region = PitchedRegion::whole(4, 3, 2);
        let src: Vec<u8> = (1..=24).collect();
        let mut dst = vec![0u8; 48];
        copy_into_pitched(&mut dst, 8, 24, &region, &src);
        assert_eq!(&dst[0..8], &[1, 2, 3, 4, 0, 0, 0, 0]);
        assert_eq!(&dst[24..28], &[13, 14, 15, 16]);
        let mut out = Vec::new();
        copy_from_pitched(&dst, 8, 24, &region, &mut out);
        assert_eq!(out, src);
    }

    #[test]
    fn offset_region() {
        let region = PitchedRegion {
            x_bytes: 2,
            y: 1,
            z: 0,
            row_bytes: 2,
            rows: 2,
            slices: 1,
        };
        let mut dst = vec![0u8; 12];
        copy_into_pitched(&mut dst, 4, 12, &region, &[9, 8, 7, 6]);
        assert_eq!(dst, [0, 0, 0, 0, 0, 0, 9, 8, 0, 0, 7, 6]);
    }

    #[test]
    fn contiguous_fast_path() {
        let region = PitchedRegion::whole(4, 2, 1);
        assert!(region.is_contiguous(4, 8));
        assert!(!region.is_contiguous(8, 16));
        let mut out = Vec::new();
        copy_from_pitched(&[1, 2, 3, 4, 5, 6, 7, 8, 99], 4, 8, &region, &mut out);
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
