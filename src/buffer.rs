// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Linear buffers of typed elements.

A [`Buffer`] holds `length` elements of `E`. Which of its access methods succeed is fixed by the
[`Usage`] it was built with:

| method            | usage                               | where it runs                        |
|-------------------|-------------------------------------|--------------------------------------|
| [`Buffer::discard_write`] | `DiscardWrite`              | calling thread                       |
| [`Buffer::write`]         | `Write`                     | calling thread, one update-region    |
| [`Buffer::write`]         | `StagingWrite`, `StagingReadWrite` | device thread, not waited for |
| [`Buffer::read`]          | `StagingRead`, `StagingReadWrite`  | device thread, waited for     |
| [`Buffer::read_write`]    | `StagingReadWrite`          | map and unmap on the device thread   |

Vertex, index and constant buffers are the same type with a narrower usage table; see
[`BufferKind`].
*/

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::addressing::SubresourceBox;
use crate::capability::{GpuBindings, Operation, ResourceClass, Usage};
use crate::device::Device;
use crate::error::{Error, NativeResultExt, Result};
use crate::lifecycle::{short_type_name, Access, Resource, ResourceCore};
use crate::mapping::{MappedSubresourceGuard, Route};
use crate::native::{BufferDesc, MapMode, ViewKind, ViewRange};
use crate::pixel_formats::{
    elements_as_bytes, elements_from_bytes, with_elements_mut, Element, ResourceFormat,
};
use crate::view::{check_range, ResourceView, ShaderResourceView, UnorderedAccessView};

/// Which pipeline role a buffer plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Shader-visible, any usage.
    General,
    Vertex,
    /// Elements must be `u16` or `u32`.
    Index,
    /// Size must be a multiple of 16 bytes.
    Constant,
}

impl BufferKind {
    pub const fn class(self) -> ResourceClass {
        match self {
            BufferKind::General => ResourceClass::Buffer,
            BufferKind::Vertex => ResourceClass::VertexBuffer,
            BufferKind::Index => ResourceClass::IndexBuffer,
            BufferKind::Constant => ResourceClass::ConstantBuffer,
        }
    }
}

/**
Describes a buffer to create.

Builders are plain values: every `with_*` method returns a modified copy.
*/
#[derive(Debug, Clone)]
pub struct BufferBuilder<E: Element> {
    kind: BufferKind,
    usage: Usage,
    bindings: GpuBindings,
    length: u32,
    initial_data: Option<Vec<E>>,
}

impl<E: Element> BufferBuilder<E> {
    /// A general buffer, `Immutable` and readable from shaders by default.
    pub fn new() -> Self {
        Self::of_kind(
            BufferKind::General,
            Usage::Immutable,
            GpuBindings::READABLE_SHADER_RESOURCE,
        )
    }

    pub fn vertex() -> Self {
        Self::of_kind(BufferKind::Vertex, Usage::Immutable, GpuBindings::NONE)
    }

    pub fn index() -> Self {
        Self::of_kind(BufferKind::Index, Usage::Immutable, GpuBindings::NONE)
    }

    /// A single-element, per-frame constant buffer.
    pub fn constant() -> Self {
        let mut b = Self::of_kind(BufferKind::Constant, Usage::DiscardWrite, GpuBindings::NONE);
        b.length = 1;
        b
    }

    fn of_kind(kind: BufferKind, usage: Usage, bindings: GpuBindings) -> Self {
        BufferBuilder {
            kind,
            usage,
            bindings,
            length: 0,
            initial_data: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_bindings(mut self, bindings: GpuBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Sets the initial contents; the length follows the data.
    pub fn with_initial_data(mut self, data: impl Into<Vec<E>>) -> Self {
        let data = data.into();
        self.length = u32::try_from(data.len()).unwrap_or(u32::MAX);
        self.initial_data = Some(data);
        self
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn bindings(&self) -> GpuBindings {
        self.bindings
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    fn validate(&self) -> Result<u64> {
        let class = self.kind.class();
        class.check_usage(self.usage)?;
        class.check_bindings(self.bindings)?;
        if E::SIZE == 0 {
            return Err(Error::InvalidArgument(
                "Buffer elements must have a non-zero size.".to_string(),
            ));
        }
        if self.length == 0 {
            return Err(Error::InvalidArgument(
                "Buffer length must be greater than zero.".to_string(),
            ));
        }
        if let Some(data) = &self.initial_data {
            if data.len() != self.length as usize {
                return Err(Error::InvalidArgument(format!(
                    "Initial data holds {} elements but the buffer length is {}.",
                    data.len(),
                    self.length
                )));
            }
        }
        if self.usage == Usage::Immutable && self.initial_data.is_none() {
            return Err(Error::InvalidArgument(
                "Immutable buffers must be created with initial data.".to_string(),
            ));
        }
        if self.kind == BufferKind::General
            && matches!(self.usage, Usage::Immutable | Usage::DiscardWrite)
            && self.bindings.is_empty()
        {
            return Err(Error::InvalidArgument(format!(
                "A buffer with usage '{}' and no GPU bindings can never be accessed.",
                self.usage
            )));
        }
        if self.usage.is_staging() && !self.bindings.is_empty() {
            return Err(Error::InvalidArgument(
                "Staging buffers can not be bound to the pipeline.".to_string(),
            ));
        }
        if self.kind == BufferKind::Index
            && !matches!(E::FORMAT, ResourceFormat::R16Uint | ResourceFormat::R32Uint)
        {
            return Err(Error::InvalidArgument(format!(
                "Index buffers must hold u16 or u32 elements, not {}.",
                short_type_name::<E>()
            )));
        }
        let size = E::SIZE as u64 * self.length as u64;
        if self.kind == BufferKind::Constant && size % 16 != 0 {
            return Err(Error::InvalidArgument(format!(
                "Constant buffer size must be a multiple of 16 bytes, got {size}."
            )));
        }
        if size > u32::MAX as u64 {
            return Err(Error::InvalidArgument(format!(
                "Buffer of {size} bytes exceeds the native size limit."
            )));
        }
        Ok(size)
    }

    /// Validates the description and creates the buffer on `device`.
    pub fn create(&self, device: &Arc<Device>) -> Result<Buffer<E>> {
        let size = self.validate()?;
        let structured = E::FORMAT == ResourceFormat::Unknown;
        let desc = BufferDesc {
            element_size: E::SIZE as u32,
            length: self.length,
            usage: self.usage,
            bindings: self.bindings,
            format: E::FORMAT,
            structured,
            allow_raw_access: !structured
                && self.bindings.intersects(
                    GpuBindings::READABLE_SHADER_RESOURCE | GpuBindings::WRITABLE_SHADER_RESOURCE,
                ),
            initial_data: self.initial_data.as_deref().map(elements_as_bytes),
        };
        let id = device.native().create_buffer(&desc).native("create_buffer")?;
        let type_name = format!("{}<{}>", self.kind.class(), short_type_name::<E>());
        Ok(Buffer {
            core: ResourceCore::new(
                device.clone(),
                id,
                self.kind.class(),
                self.usage,
                self.bindings,
                size,
                type_name,
                false,
            ),
            kind: self.kind,
            length: self.length,
            _element: PhantomData,
        })
    }
}

impl<E: Element> Default for BufferBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A GPU buffer of `length` elements of `E`.
pub struct Buffer<E: Element> {
    core: ResourceCore,
    kind: BufferKind,
    length: u32,
    _element: PhantomData<fn() -> E>,
}

impl<E: Element> Buffer<E> {
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn element_size(&self) -> usize {
        E::SIZE
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Structured buffers hold user types with no typed format.
    pub fn is_structured(&self) -> bool {
        E::FORMAT == ResourceFormat::Unknown
    }

    fn byte_len(&self) -> usize {
        self.length as usize * E::SIZE
    }

    fn check_span(&self, offset: u32, count: usize) -> Result<()> {
        let end = offset as u64 + count as u64;
        if end > self.length as u64 {
            return Err(Error::Bounds(format!(
                "{count} elements at offset {offset} exceed buffer length {}",
                self.length
            )));
        }
        Ok(())
    }

    /**
    Replaces the buffer's contents, starting at element `offset`.

    The previous contents are discarded by the driver, including elements outside the written range.
    */
    pub fn discard_write(&self, data: &[E], offset: u32) -> Result<()> {
        self.core.check(Operation::DiscardWrite)?;
        self.check_span(offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let start = offset as usize * E::SIZE;
        let bytes = elements_as_bytes(data);
        self.core.mutate(Access::Write, || {
            let device = self.core.device();
            let mut mapping = MappedSubresourceGuard::map(
                Route::Inline(device.native()),
                self.core.id(),
                0,
                MapMode::WriteDiscard,
            )?;
            mapping.bytes_mut()[start..start + bytes.len()].copy_from_slice(bytes);
            mapping.unmap()
        })?;
        Ok(())
    }

    /**
    Writes `data` at element `offset`.

    For `Write` usage this is a single update-region call on the calling thread. Staging buffers
    copy `data` and queue a map-write on the device thread; this returns before the write lands,
    and a failure there is logged rather than returned.
    */
    pub fn write(&self, data: &[E], offset: u32) -> Result<()> {
        self.core.check(Operation::Write)?;
        self.check_span(offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let start = offset as usize * E::SIZE;
        let bytes = elements_as_bytes(data);
        let id = self.core.id();
        self.core.mutate(Access::Write, || {
            let device = self.core.device();
            if self.core.usage().should_update_subresource_region() {
                let region = SubresourceBox::span(start as u32, (start + bytes.len()) as u32);
                device
                    .native()
                    .update_subresource_region(id, 0, &region, bytes, bytes.len(), bytes.len())
                    .native("update_subresource_region")
            } else {
                let owned = bytes.to_vec();
                device.gateway().run_async("buffer write", move |native| {
                    let mut mapping =
                        MappedSubresourceGuard::map(Route::Inline(native), id, 0, MapMode::Write)?;
                    mapping.bytes_mut()[start..start + owned.len()].copy_from_slice(&owned);
                    mapping.unmap()
                })
            }
        })?;
        Ok(())
    }

    /// Reads every element. A disposed buffer reads as zeroes.
    pub fn read(&self) -> Result<Vec<E>> {
        self.core.check(Operation::Read)?;
        let Some(_guard) = self.core.lock_live(Access::Read) else {
            return Ok(vec![bytemuck::Zeroable::zeroed(); self.length as usize]);
        };
        let id = self.core.id();
        let len = self.byte_len();
        let bytes = self
            .core
            .device()
            .gateway()
            .run_blocking(move |native| -> Result<Vec<u8>> {
                let mapping =
                    MappedSubresourceGuard::map(Route::Inline(native), id, 0, MapMode::Read)?;
                let out = mapping.bytes()[..len].to_vec();
                mapping.unmap()?;
                Ok(out)
            })??;
        Ok(elements_from_bytes(&bytes))
    }

    /**
    Maps the buffer for reading and writing and hands its elements to `f`.

    `f` runs on the calling thread while the buffer is mapped; its changes are written back when it returns.
    */
    pub fn read_write(&self, f: impl FnOnce(&mut [E])) -> Result<()> {
        self.core.check(Operation::ReadWrite)?;
        let len = self.byte_len();
        self.core.mutate(Access::Write, || {
            let mut mapping = MappedSubresourceGuard::map(
                Route::DeviceThread(self.core.device().gateway()),
                self.core.id(),
                0,
                MapMode::ReadWrite,
            )?;
            with_elements_mut(&mut mapping.bytes_mut()[..len], f);
            mapping.unmap()
        })?;
        Ok(())
    }

    fn check_copy_target(&self, dest: &Buffer<E>) -> Result<()> {
        if self.core.id() == dest.core.id() {
            return Err(Error::InvalidArgument(
                "Can not copy a buffer onto itself.".to_string(),
            ));
        }
        if !Arc::ptr_eq(self.core.device(), dest.core.device()) {
            return Err(Error::InvalidArgument(
                "Can not copy between buffers of different devices.".to_string(),
            ));
        }
        dest.core.check(Operation::CopyDestination)
    }

    /// Copies the whole buffer into `dest`, which must be of the same kind and length.
    pub fn copy_to(&self, dest: &Buffer<E>) -> Result<()> {
        self.check_copy_target(dest)?;
        if self.kind != dest.kind || self.length != dest.length {
            return Err(Error::InvalidArgument(format!(
                "Can not copy {} to {}: kinds or lengths differ.",
                self.core, dest.core
            )));
        }
        let Some(_guards) = self.core.lock_pair(&dest.core) else {
            return Ok(());
        };
        let (source, destination) = (self.core.id(), dest.core.id());
        self.core
            .device()
            .gateway()
            .run_blocking(move |native| native.copy_resource(source, destination))?
            .native("copy_resource")
    }

    /// Copies `count` elements starting at `first` into `dest` at `dest_start`.
    pub fn copy_region_to(
        &self,
        dest: &Buffer<E>,
        first: u32,
        count: u32,
        dest_start: u32,
    ) -> Result<()> {
        self.check_copy_target(dest)?;
        self.check_span(first, count as usize)?;
        dest.check_span(dest_start, count as usize)?;
        if count == 0 {
            return Ok(());
        }
        let Some(_guards) = self.core.lock_pair(&dest.core) else {
            return Ok(());
        };
        let size = E::SIZE as u32;
        let region = SubresourceBox::span(first * size, (first + count) * size);
        let (source, destination) = (self.core.id(), dest.core.id());
        let dst_x = dest_start * size;
        self.core
            .device()
            .gateway()
            .run_blocking(move |native| {
                native.copy_subresource_region(source, 0, &region, destination, 0, dst_x, 0, 0)
            })?
            .native("copy_subresource_region")
    }

    /// A shader-resource view of `count` elements starting at `first`.
    pub fn create_view(&self, first: u32, count: u32) -> Result<ShaderResourceView> {
        check_range("element", first, count, self.length)?;
        ResourceView::create(
            &self.core,
            ViewKind::ShaderResource,
            E::FORMAT,
            ViewRange::Elements { first, count },
        )
        .map(ShaderResourceView)
    }

    pub fn create_view_all(&self) -> Result<ShaderResourceView> {
        self.create_view(0, self.length)
    }

    /**
    An unordered-access view of `count` elements starting at `first`.

    `append_consume` and `include_counter` are mutually exclusive, and neither is available on
    typed buffers, whose views are raw.
    */
    pub fn create_unordered_access_view(
        &self,
        first: u32,
        count: u32,
        append_consume: bool,
        include_counter: bool,
    ) -> Result<UnorderedAccessView> {
        check_range("element", first, count, self.length)?;
        if append_consume && include_counter {
            return Err(Error::InvalidArgument(
                "Append/consume support and a hidden counter are mutually exclusive.".to_string(),
            ));
        }
        let raw = !self.is_structured();
        if raw && (append_consume || include_counter) {
            return Err(Error::InvalidArgument(
                "Append/consume and counter views require a structured buffer.".to_string(),
            ));
        }
        ResourceView::create(
            &self.core,
            ViewKind::UnorderedAccess {
                append_consume,
                include_counter,
                raw,
            },
            E::FORMAT,
            ViewRange::Elements { first, count },
        )
        .map(UnorderedAccessView)
    }

    /**
    A builder that recreates this buffer.

    With `include_data` the current contents are read back as initial data, which requires a
    readable usage.
    */
    pub fn clone_builder(&self, include_data: bool) -> Result<BufferBuilder<E>> {
        let mut builder = BufferBuilder::of_kind(self.kind, self.core.usage(), self.core.bindings())
            .with_length(self.length);
        if include_data {
            builder = builder.with_initial_data(self.read()?);
        }
        Ok(builder)
    }
}

impl<E: Element> Resource for Buffer<E> {
    fn core(&self) -> &ResourceCore {
        &self.core
    }
}

impl<E: Element> std::fmt::Debug for Buffer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("core", &self.core)
            .field("kind", &self.kind)
            .field("length", &self.length)
            .finish()
    }
}

impl<E: Element> Display for Buffer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} x {}B)", self.core, self.length, E::SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::software::SoftwareDevice;

    fn device() -> (Arc<SoftwareDevice>, Arc<Device>) {
        let native = Arc::new(SoftwareDevice::new());
        let device = Device::new(native.clone()).unwrap();
        (native, device)
    }

    #[test]
    fn constant_buffers_are_sixteen_byte_multiples() {
        let (_, device) = device();
        let err = BufferBuilder::<f32>::constant().create(&device).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let b = BufferBuilder::<[f32; 4]>::constant().create(&device).unwrap();
        assert_eq!(b.size(), 16);
        b.dispose().unwrap();
    }

    #[test]
    fn index_buffers_need_integer_elements() {
        let (_, device) = device();
        let err = BufferBuilder::<f32>::index()
            .with_initial_data(vec![0.0; 3])
            .create(&device)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let b = BufferBuilder::<u16>::index()
            .with_initial_data(vec![0, 1, 2])
            .create(&device)
            .unwrap();
        b.dispose().unwrap();
    }

    #[test]
    fn builder_rejections_make_no_native_call() {
        let (native, device) = device();
        let cases = [
            BufferBuilder::<f32>::new().with_length(4),
            BufferBuilder::<f32>::new()
                .with_usage(Usage::StagingRead)
                .with_length(4),
            BufferBuilder::<f32>::new()
                .with_usage(Usage::DiscardWrite)
                .with_bindings(GpuBindings::NONE)
                .with_length(4),
            BufferBuilder::<f32>::new().with_usage(Usage::Write),
            BufferBuilder::<f32>::vertex()
                .with_usage(Usage::StagingRead)
                .with_length(4),
        ];
        for case in cases {
            assert!(case.create(&device).is_err(), "{case:?}");
        }
        assert_eq!(native.call_count(), 0);
    }

    #[test]
    fn write_usage_uses_one_update_region() {
        let (native, device) = device();
        let b = BufferBuilder::<u32>::new()
            .with_usage(Usage::Write)
            .with_length(8)
            .create(&device)
            .unwrap();
        native.clear_calls();
        b.write(&[7, 8], 3).unwrap();
        assert_eq!(native.call_count(), 1);
        assert_eq!(native.count_of("update_subresource_region"), 1);
        let bytes = native.subresource_contents(b.id(), 0).unwrap();
        let contents: Vec<u32> = elements_from_bytes(&bytes);
        assert_eq!(contents, [0, 0, 0, 7, 8, 0, 0, 0]);
        b.dispose().unwrap();
    }

    #[test]
    fn staging_write_is_queued_on_device_thread() {
        let (native, device) = device();
        let b = BufferBuilder::<u32>::new()
            .with_usage(Usage::StagingWrite)
            .with_bindings(GpuBindings::NONE)
            .with_length(4)
            .create(&device)
            .unwrap();
        b.write(&[1, 2, 3, 4], 0).unwrap();
        device.flush().unwrap();
        let map = native
            .calls()
            .into_iter()
            .find(|c| c.name == "map_subresource")
            .unwrap();
        assert_eq!(map.thread, device.gateway().thread_id());
        let contents: Vec<u32> =
            elements_from_bytes(&native.subresource_contents(b.id(), 0).unwrap());
        assert_eq!(contents, [1, 2, 3, 4]);
        b.dispose().unwrap();
    }

    #[test]
    fn out_of_range_write_is_bounds_error() {
        let (native, device) = device();
        let b = BufferBuilder::<u32>::new()
            .with_usage(Usage::StagingReadWrite)
            .with_bindings(GpuBindings::NONE)
            .with_length(4)
            .create(&device)
            .unwrap();
        native.clear_calls();
        assert!(matches!(b.write(&[1, 2], 3), Err(Error::Bounds(_))));
        assert_eq!(native.call_count(), 0);
        b.dispose().unwrap();
    }

    #[test]
    fn typed_buffers_refuse_counters() {
        let (_, device) = device();
        let b = BufferBuilder::<f32>::new()
            .with_usage(Usage::Write)
            .with_bindings(GpuBindings::WRITABLE_SHADER_RESOURCE)
            .with_length(4)
            .create(&device)
            .unwrap();
        assert!(b.create_unordered_access_view(0, 4, true, false).is_err());
        let uav = b.create_unordered_access_view(0, 4, false, false).unwrap();
        assert!(uav.is_raw());
        uav.dispose().unwrap();
        b.dispose().unwrap();
    }

    #[test]
    fn display_names_element_type() {
        let (_, device) = device();
        let b = BufferBuilder::<f32>::new()
            .with_usage(Usage::DiscardWrite)
            .with_length(10)
            .create(&device)
            .unwrap();
        let s = b.to_string();
        assert!(s.starts_with("[Buffer<f32>, DiscardWrite + READABLE_SHADER_RESOURCE, 40B, "), "{s}");
        assert!(s.ends_with("(10 x 4B)"), "{s}");
        b.dispose().unwrap();
    }
}
