// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
An in-memory [`NativeDevice`].

`SoftwareDevice` keeps every subresource in a heap allocation laid out the way a driver would:
rows padded to a configurable alignment, slices one after another. It enforces the driver's
mapping rules for each usage and records every call it receives, with the calling thread, so
callers can observe exactly which native operations an access produced.

It does not rasterize. Mip generation point-samples the level above.
*/

use std::collections::HashMap;
use std::thread::ThreadId;

use parking_lot::Mutex;

use crate::addressing::{mip_dimension, SubresourceBox};
use crate::capability::Usage;
use crate::error::NativeError;
use crate::native::{
    BufferDesc, MapMode, MappedSubresource, NativeDevice, ResourceId, TextureDesc,
    TextureDimension, ViewDesc, ViewId, ViewKind, ViewRange,
};

/// Layout knobs for [`SoftwareDevice`].
#[derive(Debug, Clone)]
pub struct SoftwareDeviceConfig {
    /// Texture rows are padded to a multiple of this many bytes.
    pub row_pitch_alignment: usize,
}

impl Default for SoftwareDeviceConfig {
    fn default() -> Self {
        SoftwareDeviceConfig {
            row_pitch_alignment: 1,
        }
    }
}

impl SoftwareDeviceConfig {
    pub fn row_pitch_alignment(mut self, alignment: usize) -> Self {
        self.row_pitch_alignment = alignment.max(1);
        self
    }
}

/// One recorded call into the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCall {
    pub name: &'static str,
    pub resource: Option<ResourceId>,
    pub thread: ThreadId,
}

#[derive(Debug)]
struct Subresource {
    data: Box<[u8]>,
    width: u32,
    height: u32,
    depth: u32,
    row_pitch: usize,
    depth_pitch: usize,
    mapped: bool,
}

impl Subresource {
    fn new(width: u32, height: u32, depth: u32, unit: usize, alignment: usize) -> Self {
        let row_pitch = (width as usize * unit).next_multiple_of(alignment);
        let depth_pitch = row_pitch * height as usize;
        Subresource {
            data: vec![0; depth_pitch * depth as usize].into_boxed_slice(),
            width,
            height,
            depth,
            row_pitch,
            depth_pitch,
            mapped: false,
        }
    }

    fn offset(&self, x: u32, y: u32, z: u32, unit: usize) -> usize {
        z as usize * self.depth_pitch + y as usize * self.row_pitch + x as usize * unit
    }

    /// Copies `region` out as tightly packed rows.
    fn read_region(&self, region: &SubresourceBox, unit: usize) -> Vec<u8> {
        let row_bytes = region.width() as usize * unit;
        let mut out = Vec::with_capacity(row_bytes * (region.height() * region.depth()) as usize);
        for z in region.front..region.back {
            for y in region.top..region.bottom {
                let start = self.offset(region.left, y, z, unit);
                out.extend_from_slice(&self.data[start..start + row_bytes]);
            }
        }
        out
    }

    /// Writes rows of `src`, `src_row_pitch`/`src_depth_pitch` apart, into `region`.
    fn write_region(
        &mut self,
        region: &SubresourceBox,
        unit: usize,
        src: &[u8],
        src_row_pitch: usize,
        src_depth_pitch: usize,
    ) {
        let row_bytes = region.width() as usize * unit;
        for (sz, z) in (region.front..region.back).enumerate() {
            for (sy, y) in (region.top..region.bottom).enumerate() {
                let from = sz * src_depth_pitch + sy * src_row_pitch;
                let to = self.offset(region.left, y, z, unit);
                self.data[to..to + row_bytes].copy_from_slice(&src[from..from + row_bytes]);
            }
        }
    }

    fn extents(&self) -> SubresourceBox {
        SubresourceBox::volume_of(0, self.width, 0, self.height, 0, self.depth)
    }
}

#[derive(Debug)]
struct SoftResource {
    usage: Usage,
    dimension: Option<TextureDimension>,
    /// Bytes per addressable unit: the texel size, or 1 for buffers.
    unit: usize,
    mip_levels: u32,
    array_size: u32,
    subresources: Vec<Subresource>,
}

impl SoftResource {
    fn subresource(&self, index: u32) -> Result<&Subresource, NativeError> {
        self.subresources
            .get(index as usize)
            .ok_or_else(|| NativeError::new(format!("no subresource {index}")))
    }

    fn subresource_mut(&mut self, index: u32) -> Result<&mut Subresource, NativeError> {
        self.subresources
            .get_mut(index as usize)
            .ok_or_else(|| NativeError::new(format!("no subresource {index}")))
    }

    fn any_mapped(&self) -> bool {
        self.subresources.iter().any(|s| s.mapped)
    }
}

#[derive(Debug)]
struct SoftView {
    resource: ResourceId,
    desc: ViewDesc,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    resources: HashMap<ResourceId, SoftResource>,
    views: HashMap<ViewId, SoftView>,
    calls: Vec<NativeCall>,
    failures: HashMap<&'static str, String>,
}

impl State {
    fn record(&mut self, name: &'static str, resource: Option<ResourceId>) -> Result<(), NativeError> {
        self.calls.push(NativeCall {
            name,
            resource,
            thread: std::thread::current().id(),
        });
        match self.failures.remove(name) {
            Some(message) => Err(NativeError::new(message)),
            None => Ok(()),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn resource(&self, id: ResourceId) -> Result<&SoftResource, NativeError> {
        self.resources
            .get(&id)
            .ok_or_else(|| NativeError::new(format!("unknown resource {id}")))
    }

    fn resource_mut(&mut self, id: ResourceId) -> Result<&mut SoftResource, NativeError> {
        self.resources
            .get_mut(&id)
            .ok_or_else(|| NativeError::new(format!("unknown resource {id}")))
    }
}

/// In-memory implementation of [`NativeDevice`].
#[derive(Debug, Default)]
pub struct SoftwareDevice {
    config: SoftwareDeviceConfig,
    state: Mutex<State>,
}

impl SoftwareDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SoftwareDeviceConfig) -> Self {
        SoftwareDevice {
            config,
            state: Mutex::default(),
        }
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Number of recorded calls with the given name, e.g. `"map_subresource"`.
    pub fn count_of(&self, name: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| c.name == name).count()
    }

    /// Number of recorded calls with the given name that targeted `resource`.
    pub fn count_for(&self, name: &str, resource: ResourceId) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.name == name && c.resource == Some(resource))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Makes the next call named `name` fail with `message`.
    pub fn fail_next(&self, name: &'static str, message: impl Into<String>) {
        self.state.lock().failures.insert(name, message.into());
    }

    pub fn live_resources(&self) -> usize {
        self.state.lock().resources.len()
    }

    pub fn live_views(&self) -> usize {
        self.state.lock().views.len()
    }

    pub fn contains(&self, resource: ResourceId) -> bool {
        self.state.lock().resources.contains_key(&resource)
    }

    /// Tightly packed contents of one subresource, without recording a call.
    pub fn subresource_contents(&self, resource: ResourceId, subresource: u32) -> Option<Vec<u8>> {
        let state = self.state.lock();
        let r = state.resources.get(&resource)?;
        let s = r.subresources.get(subresource as usize)?;
        Some(s.read_region(&s.extents(), r.unit))
    }

    /// Row pitch the device would report for one subresource.
    pub fn row_pitch(&self, resource: ResourceId, subresource: u32) -> Option<usize> {
        let state = self.state.lock();
        let r = state.resources.get(&resource)?;
        r.subresources.get(subresource as usize).map(|s| s.row_pitch)
    }
}

fn check_map_mode(id: ResourceId, usage: Usage, mode: MapMode) -> Result<(), NativeError> {
    let allowed = match mode {
        MapMode::Read => usage.should_map_read(),
        MapMode::Write => usage.should_map_write(),
        MapMode::ReadWrite => usage.should_map_read_write(),
        MapMode::WriteDiscard => usage.should_map_write_discard(),
    };
    if allowed {
        Ok(())
    } else {
        Err(NativeError::new(format!(
            "resource {id} with usage {usage} can not be mapped {mode:?}"
        )))
    }
}

fn check_region(region: &SubresourceBox, target: &Subresource) -> Result<(), NativeError> {
    if region.left > region.right
        || region.top > region.bottom
        || region.front > region.back
        || region.right > target.width
        || region.bottom > target.height
        || region.back > target.depth
    {
        return Err(NativeError::new(format!(
            "region {region:?} outside {}x{}x{}",
            target.width, target.height, target.depth
        )));
    }
    Ok(())
}

fn check_not_mapped(id: ResourceId, r: &SoftResource) -> Result<(), NativeError> {
    if r.any_mapped() {
        Err(NativeError::new(format!("resource {id} is mapped")))
    } else {
        Ok(())
    }
}

unsafe impl NativeDevice for SoftwareDevice {
    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<ResourceId, NativeError> {
        let mut state = self.state.lock();
        state.record("create_buffer", None)?;
        let bytes = desc.element_size as usize * desc.length as usize;
        if bytes == 0 {
            return Err(NativeError::new("zero-sized buffer"));
        }
        let mut sub = Subresource::new(bytes as u32, 1, 1, 1, 1);
        if let Some(data) = desc.initial_data {
            if data.len() != bytes {
                return Err(NativeError::new(format!(
                    "initial data is {} bytes, buffer is {bytes}",
                    data.len()
                )));
            }
            sub.data.copy_from_slice(data);
        }
        let id = ResourceId::from_raw(state.next_id());
        state.resources.insert(
            id,
            SoftResource {
                usage: desc.usage,
                dimension: None,
                unit: 1,
                mip_levels: 1,
                array_size: 1,
                subresources: vec![sub],
            },
        );
        Ok(id)
    }

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<ResourceId, NativeError> {
        let mut state = self.state.lock();
        state.record("create_texture", None)?;
        if desc.width == 0 || desc.height == 0 || desc.depth == 0 || desc.array_size == 0 {
            return Err(NativeError::new("zero-sized texture"));
        }
        if desc.mip_levels == 0 || desc.texel_size == 0 {
            return Err(NativeError::new("texture needs at least one mip and a texel size"));
        }
        let unit = desc.texel_size as usize;
        let mut subresources = Vec::with_capacity((desc.array_size * desc.mip_levels) as usize);
        for _ in 0..desc.array_size {
            for mip in 0..desc.mip_levels {
                subresources.push(Subresource::new(
                    mip_dimension(desc.width, mip),
                    mip_dimension(desc.height, mip),
                    mip_dimension(desc.depth, mip),
                    unit,
                    self.config.row_pitch_alignment,
                ));
            }
        }
        if let Some(data) = desc.initial_data {
            let expected: usize = subresources
                .iter()
                .map(|s| (s.width * s.height * s.depth) as usize * unit)
                .sum();
            if data.len() != expected {
                return Err(NativeError::new(format!(
                    "initial data is {} bytes, texture needs {expected}",
                    data.len()
                )));
            }
            let mut cursor = 0;
            for s in &mut subresources {
                let row = s.width as usize * unit;
                let tight = row * (s.height * s.depth) as usize;
                let extents = s.extents();
                s.write_region(
                    &extents,
                    unit,
                    &data[cursor..cursor + tight],
                    row,
                    row * s.height as usize,
                );
                cursor += tight;
            }
        }
        let id = ResourceId::from_raw(state.next_id());
        state.resources.insert(
            id,
            SoftResource {
                usage: desc.usage,
                dimension: Some(desc.dimension),
                unit,
                mip_levels: desc.mip_levels,
                array_size: desc.array_size,
                subresources,
            },
        );
        Ok(id)
    }

    fn map_subresource(
        &self,
        resource: ResourceId,
        subresource: u32,
        mode: MapMode,
    ) -> Result<MappedSubresource, NativeError> {
        let mut state = self.state.lock();
        state.record("map_subresource", Some(resource))?;
        let r = state.resource_mut(resource)?;
        check_map_mode(resource, r.usage, mode)?;
        let s = r.subresource_mut(subresource)?;
        if s.mapped {
            return Err(NativeError::new(format!(
                "subresource {subresource} of {resource} is already mapped"
            )));
        }
        s.mapped = true;
        Ok(MappedSubresource {
            data: s.data.as_mut_ptr(),
            len: s.data.len(),
            row_pitch: s.row_pitch,
            depth_pitch: s.depth_pitch,
        })
    }

    fn unmap_subresource(&self, resource: ResourceId, subresource: u32) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        state.record("unmap_subresource", Some(resource))?;
        let s = state.resource_mut(resource)?.subresource_mut(subresource)?;
        if !s.mapped {
            return Err(NativeError::new(format!(
                "subresource {subresource} of {resource} is not mapped"
            )));
        }
        s.mapped = false;
        Ok(())
    }

    fn update_subresource_region(
        &self,
        resource: ResourceId,
        subresource: u32,
        region: &SubresourceBox,
        data: &[u8],
        row_pitch: usize,
        depth_pitch: usize,
    ) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        state.record("update_subresource_region", Some(resource))?;
        let r = state.resource_mut(resource)?;
        if !r.usage.should_update_subresource_region() {
            return Err(NativeError::new(format!(
                "resource {resource} with usage {} can not be updated in place",
                r.usage
            )));
        }
        let unit = r.unit;
        let s = r.subresource_mut(subresource)?;
        check_region(region, s)?;
        if s.mapped {
            return Err(NativeError::new(format!("resource {resource} is mapped")));
        }
        let needed = if region.volume() == 0 {
            0
        } else {
            (region.depth() as usize - 1) * depth_pitch
                + (region.height() as usize - 1) * row_pitch
                + region.width() as usize * unit
        };
        if data.len() < needed {
            return Err(NativeError::new(format!(
                "update needs {needed} bytes, got {}",
                data.len()
            )));
        }
        s.write_region(region, unit, data, row_pitch, depth_pitch);
        Ok(())
    }

    fn copy_resource(&self, source: ResourceId, destination: ResourceId) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        state.record("copy_resource", Some(destination))?;
        if source == destination {
            return Err(NativeError::new("can not copy a resource onto itself"));
        }
        let src = state.resource(source)?;
        check_not_mapped(source, src)?;
        let unit = src.unit;
        let contents: Vec<(SubresourceBox, Vec<u8>)> = src
            .subresources
            .iter()
            .map(|s| (s.extents(), s.read_region(&s.extents(), unit)))
            .collect();
        let dst = state.resource_mut(destination)?;
        check_not_mapped(destination, dst)?;
        if dst.usage == Usage::Immutable {
            return Err(NativeError::new("destination is immutable"));
        }
        if dst.unit != unit
            || dst.subresources.len() != contents.len()
            || dst
                .subresources
                .iter()
                .zip(&contents)
                .any(|(d, (extents, _))| d.extents() != *extents)
        {
            return Err(NativeError::new("resources differ in layout"));
        }
        for (d, (extents, bytes)) in dst.subresources.iter_mut().zip(contents) {
            let row = extents.width() as usize * unit;
            d.write_region(&extents, unit, &bytes, row, row * extents.height() as usize);
        }
        Ok(())
    }

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
    ) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        state.record("copy_subresource_region", Some(destination))?;
        if source == destination && source_subresource == destination_subresource {
            return Err(NativeError::new("can not copy a subresource onto itself"));
        }
        let src = state.resource(source)?;
        let unit = src.unit;
        let s = src.subresource(source_subresource)?;
        check_region(region, s)?;
        if s.mapped {
            return Err(NativeError::new(format!("resource {source} is mapped")));
        }
        let bytes = s.read_region(region, unit);
        let dst = state.resource_mut(destination)?;
        if dst.usage == Usage::Immutable {
            return Err(NativeError::new("destination is immutable"));
        }
        if dst.unit != unit {
            return Err(NativeError::new("resources differ in texel size"));
        }
        let d = dst.subresource_mut(destination_subresource)?;
        let target = SubresourceBox::volume_of(
            dst_x,
            dst_x + region.width(),
            dst_y,
            dst_y + region.height(),
            dst_z,
            dst_z + region.depth(),
        );
        check_region(&target, d)?;
        if d.mapped {
            return Err(NativeError::new(format!("resource {destination} is mapped")));
        }
        let row = region.width() as usize * unit;
        d.write_region(&target, unit, &bytes, row, row * region.height() as usize);
        Ok(())
    }

    fn release_resource(&self, resource: ResourceId) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        state.record("release_resource", Some(resource))?;
        match state.resources.remove(&resource) {
            Some(_) => Ok(()),
            None => Err(NativeError::new(format!("unknown resource {resource}"))),
        }
    }

    fn create_view(&self, resource: ResourceId, desc: &ViewDesc) -> Result<ViewId, NativeError> {
        let mut state = self.state.lock();
        state.record("create_view", Some(resource))?;
        let r = state.resource(resource)?;
        match desc.range {
            ViewRange::Elements { count, .. } => {
                if r.dimension.is_some() {
                    return Err(NativeError::new("element range on a texture"));
                }
                if count == 0 {
                    return Err(NativeError::new("empty element range"));
                }
            }
            ViewRange::Texture {
                first_mip,
                num_mips,
                first_array,
                array_count,
                ..
            } => {
                if r.dimension.is_none() {
                    return Err(NativeError::new("texture range on a buffer"));
                }
                if num_mips == 0 || first_mip + num_mips > r.mip_levels {
                    return Err(NativeError::new("mip range out of bounds"));
                }
                let layers = match (r.dimension, desc.kind) {
                    (Some(TextureDimension::D3), ViewKind::UnorderedAccess { .. }) => {
                        mip_dimension(r.subresources[0].depth, first_mip)
                    }
                    _ => r.array_size,
                };
                if array_count == 0 || first_array + array_count > layers {
                    return Err(NativeError::new("array range out of bounds"));
                }
            }
        }
        let id = ViewId::from_raw(state.next_id());
        state.views.insert(id, SoftView { resource, desc: *desc });
        Ok(id)
    }

    fn release_view(&self, view: ViewId) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        state.record("release_view", None)?;
        match state.views.remove(&view) {
            Some(_) => Ok(()),
            None => Err(NativeError::new(format!("unknown view {}", view.raw()))),
        }
    }

    fn generate_mips(&self, view: ViewId) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        let found = state.views.get(&view).map(|v| (v.resource, v.desc));
        let Some((resource, desc)) = found else {
            state.record("generate_mips", None)?;
            return Err(NativeError::new(format!("unknown view {}", view.raw())));
        };
        state.record("generate_mips", Some(resource))?;
        let ViewRange::Texture {
            first_mip,
            num_mips,
            first_array,
            array_count,
            ..
        } = desc.range
        else {
            return Err(NativeError::new("generate_mips needs a texture view"));
        };
        if desc.kind != ViewKind::ShaderResource {
            return Err(NativeError::new("generate_mips needs a shader resource view"));
        }
        let r = state.resource_mut(resource)?;
        let unit = r.unit;
        let levels = r.mip_levels;
        for element in first_array..first_array + array_count {
            for mip in first_mip + 1..first_mip + num_mips {
                let upper = (element * levels + mip - 1) as usize;
                let lower = upper + 1;
                let (head, tail) = r.subresources.split_at_mut(lower);
                let src = &head[upper];
                let dst = &mut tail[0];
                for z in 0..dst.depth {
                    for y in 0..dst.height {
                        for x in 0..dst.width {
                            let from = src.offset(
                                (x * 2).min(src.width - 1),
                                (y * 2).min(src.height - 1),
                                (z * 2).min(src.depth - 1),
                                unit,
                            );
                            let to = dst.offset(x, y, z, unit);
                            dst.data[to..to + unit].copy_from_slice(&src.data[from..from + unit]);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::GpuBindings;
    use crate::pixel_formats::{elements_from_bytes, ResourceFormat};

    fn texture_desc(usage: Usage, width: u32, height: u32, mips: u32) -> TextureDesc<'static> {
        TextureDesc {
            dimension: TextureDimension::D2,
            width,
            height,
            depth: 1,
            array_size: 1,
            mip_levels: mips,
            texel_size: 4,
            format: ResourceFormat::R32Float,
            usage,
            bindings: GpuBindings::NONE,
            mip_generation_target: false,
            multisampled: false,
            initial_data: None,
        }
    }

    #[test]
    fn rows_are_padded() {
        let device =
            SoftwareDevice::with_config(SoftwareDeviceConfig::default().row_pitch_alignment(256));
        let id = device
            .create_texture(&texture_desc(Usage::StagingRead, 3, 2, 1))
            .unwrap();
        let m = device.map_subresource(id, 0, MapMode::Read).unwrap();
        assert_eq!(m.row_pitch, 256);
        assert_eq!(m.depth_pitch, 512);
        device.unmap_subresource(id, 0).unwrap();
    }

    #[test]
    fn mapping_rules_follow_usage() {
        let device = SoftwareDevice::new();
        let id = device
            .create_texture(&texture_desc(Usage::StagingWrite, 4, 4, 1))
            .unwrap();
        assert!(device.map_subresource(id, 0, MapMode::Read).is_err());
        assert!(device.map_subresource(id, 0, MapMode::WriteDiscard).is_err());
        device.map_subresource(id, 0, MapMode::Write).unwrap();
        assert!(device.map_subresource(id, 0, MapMode::Write).is_err());
        device.unmap_subresource(id, 0).unwrap();
        assert!(device.unmap_subresource(id, 0).is_err());
    }

    #[test]
    fn injected_failure_fires_once() {
        let device = SoftwareDevice::new();
        device.fail_next("create_texture", "out of video memory");
        let e = device
            .create_texture(&texture_desc(Usage::Write, 4, 4, 1))
            .unwrap_err();
        assert_eq!(e.message, "out of video memory");
        assert!(device.create_texture(&texture_desc(Usage::Write, 4, 4, 1)).is_ok());
        assert_eq!(device.count_of("create_texture"), 2);
    }

    #[test]
    fn update_region_writes_rows() {
        let device =
            SoftwareDevice::with_config(SoftwareDeviceConfig::default().row_pitch_alignment(64));
        let id = device
            .create_texture(&texture_desc(Usage::Write, 4, 4, 1))
            .unwrap();
        let data: Vec<u8> = (0..16).collect();
        device
            .update_subresource_region(id, 0, &SubresourceBox::area(1, 3, 2, 4), &data, 8, 16)
            .unwrap();
        let contents = device.subresource_contents(id, 0).unwrap();
        // row 2, texels 1..3
        assert_eq!(&contents[2 * 16 + 4..2 * 16 + 12], &data[0..8]);
        assert_eq!(&contents[3 * 16 + 4..3 * 16 + 12], &data[8..16]);
        assert!(contents[..2 * 16].iter().all(|b| *b == 0));
    }

    #[test]
    fn point_sampled_mips() {
        let device = SoftwareDevice::new();
        let texels: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let mut all = bytemuck::cast_slice::<f32, u8>(&texels).to_vec();
        all.extend_from_slice(&[0; 16]);
        all.extend_from_slice(&[0; 4]);
        let mut desc = texture_desc(Usage::StagingRead, 4, 4, 3);
        desc.initial_data = Some(&all);
        let id = device.create_texture(&desc).unwrap();
        let view = device
            .create_view(
                id,
                &ViewDesc {
                    kind: ViewKind::ShaderResource,
                    format: ResourceFormat::R32Float,
                    range: ViewRange::Texture {
                        first_mip: 0,
                        num_mips: 3,
                        first_array: 0,
                        array_count: 1,
                        is_array: false,
                    },
                },
            )
            .unwrap();
        device.generate_mips(view).unwrap();
        let mip1: Vec<f32> = elements_from_bytes(&device.subresource_contents(id, 1).unwrap());
        assert_eq!(mip1, [0.0, 2.0, 8.0, 10.0]);
        let mip2: Vec<f32> = elements_from_bytes(&device.subresource_contents(id, 2).unwrap());
        assert_eq!(mip2, [0.0]);
    }
}
