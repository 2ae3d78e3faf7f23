// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Describes textures before they are created.

A [`TextureBuilder`] is tagged with its [`Dimension`] so that `create` returns the matching texture
type. Every rule that can be checked without the driver is checked before the native factory is
called.
*/

use std::marker::PhantomData;
use std::sync::Arc;

use crate::addressing::full_mip_count;
use crate::capability::{GpuBindings, ResourceClass, Usage};
use crate::device::Device;
use crate::error::{Error, NativeResultExt, Result};
use crate::lifecycle::{short_type_name, ResourceCore};
use crate::native::{TextureDesc, TextureDimension};
use crate::pixel_formats::{elements_as_bytes, Texel};

use super::{
    Texture1D, Texture1DArray, Texture2D, Texture2DArray, Texture3D, TextureInner, TextureShape,
};

mod sealed {
    pub trait Sealed {}
}

/// Marks a builder with the texture dimension it creates.
pub trait Dimension: sealed::Sealed + Copy + std::fmt::Debug + Send + Sync + 'static {
    const DIMENSION: TextureDimension;
    const CLASS: ResourceClass;
}

#[derive(Debug, Clone, Copy)]
pub struct D1;
#[derive(Debug, Clone, Copy)]
pub struct D2;
#[derive(Debug, Clone, Copy)]
pub struct D3;

impl sealed::Sealed for D1 {}
impl sealed::Sealed for D2 {}
impl sealed::Sealed for D3 {}

impl Dimension for D1 {
    const DIMENSION: TextureDimension = TextureDimension::D1;
    const CLASS: ResourceClass = ResourceClass::Texture1D;
}

impl Dimension for D2 {
    const DIMENSION: TextureDimension = TextureDimension::D2;
    const CLASS: ResourceClass = ResourceClass::Texture2D;
}

impl Dimension for D3 {
    const DIMENSION: TextureDimension = TextureDimension::D3;
    const CLASS: ResourceClass = ResourceClass::Texture3D;
}

pub type Texture1DBuilder<T> = TextureBuilder<T, D1>;
pub type Texture2DBuilder<T> = TextureBuilder<T, D2>;
pub type Texture3DBuilder<T> = TextureBuilder<T, D3>;

/**
Describes a texture to create.

Builders are plain values: every `with_*` method returns a modified copy. The defaults are an
`Immutable`, shader-readable texture without mips, which needs initial data before it can be
created.
*/
#[derive(Debug, Clone)]
pub struct TextureBuilder<T: Texel, D: Dimension> {
    width: u32,
    height: u32,
    depth: u32,
    usage: Usage,
    bindings: GpuBindings,
    mipmapped: bool,
    mip_generation_target: bool,
    dynamic_detail_target: bool,
    multisampled: bool,
    initial_data: Option<Vec<T>>,
    _dimension: PhantomData<D>,
}

impl<T: Texel, D: Dimension> TextureBuilder<T, D> {
    fn with_extents(width: u32, height: u32, depth: u32) -> Self {
        TextureBuilder {
            width,
            height,
            depth,
            usage: Usage::Immutable,
            bindings: GpuBindings::READABLE_SHADER_RESOURCE,
            mipmapped: false,
            mip_generation_target: false,
            dynamic_detail_target: false,
            multisampled: false,
            initial_data: None,
            _dimension: PhantomData,
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

    /// Allocates a full mip chain. Requires power-of-two extents.
    pub fn with_mipmaps(mut self, mipmapped: bool) -> Self {
        self.mipmapped = mipmapped;
        self
    }

    /// Allows [`generate_mips`](crate::Texture2D::generate_mips) on the created texture.
    pub fn with_mip_generation_target(mut self, target: bool) -> Self {
        self.mip_generation_target = target;
        self
    }

    pub fn with_dynamic_detail_target(mut self, target: bool) -> Self {
        self.dynamic_detail_target = target;
        self
    }

    pub fn with_multisampling(mut self, multisampled: bool) -> Self {
        self.multisampled = multisampled;
        self
    }

    /**
    Sets the initial contents.

    `data` holds every mip of every array element, tightly packed: array elements outermost,
    then mips from largest to smallest.
    */
    pub fn with_initial_data(mut self, data: impl Into<Vec<T>>) -> Self {
        self.initial_data = Some(data.into());
        self
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn bindings(&self) -> GpuBindings {
        self.bindings
    }

    pub fn num_mips(&self) -> u32 {
        if self.mipmapped {
            full_mip_count(self.width, self.height, self.depth)
        } else {
            1
        }
    }

    fn shape(&self) -> TextureShape {
        TextureShape {
            dimension: D::DIMENSION,
            width: self.width,
            height: self.height,
            depth: self.depth,
            num_mips: self.num_mips(),
            mipmapped: self.mipmapped,
            mip_generation_target: self.mip_generation_target,
            dynamic_detail_target: self.dynamic_detail_target,
            multisampled: self.multisampled,
        }
    }

    pub(crate) fn from_shape(
        shape: &TextureShape,
        usage: Usage,
        bindings: GpuBindings,
        initial_data: Option<Vec<T>>,
    ) -> Self {
        TextureBuilder {
            width: shape.width,
            height: shape.height,
            depth: shape.depth,
            usage,
            bindings,
            mipmapped: shape.mipmapped,
            mip_generation_target: shape.mip_generation_target,
            dynamic_detail_target: shape.dynamic_detail_target,
            multisampled: shape.multisampled,
            initial_data,
            _dimension: PhantomData,
        }
    }

    fn invalid(message: impl Into<String>) -> Error {
        Error::InvalidArgument(message.into())
    }

    /// Checks every creation rule. `array_length` is `None` for standalone textures.
    fn validate(&self, class: ResourceClass, array_length: Option<u32>) -> Result<()> {
        class.check_usage(self.usage)?;
        class.check_bindings(self.bindings)?;
        if T::SIZE == 0 {
            return Err(Self::invalid("Texels must have a non-zero size."));
        }
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(Self::invalid(format!(
                "Texture extents must be greater than zero, got {}x{}x{}.",
                self.width, self.height, self.depth
            )));
        }
        if self.mipmapped
            && !(self.width.is_power_of_two()
                && self.height.is_power_of_two()
                && self.depth.is_power_of_two())
        {
            return Err(Self::invalid(
                "Mipmapped textures must have power-of-two dimensions.",
            ));
        }
        if self.mipmapped && self.usage == Usage::DiscardWrite {
            return Err(Self::invalid(
                "Textures with usage 'DiscardWrite' can not have mips.",
            ));
        }
        if self.mip_generation_target {
            if !self.mipmapped {
                return Err(Self::invalid(
                    "A mip generation target must allocate a mip chain.",
                ));
            }
            if !self.bindings.contains(
                GpuBindings::RENDER_TARGET | GpuBindings::READABLE_SHADER_RESOURCE,
            ) {
                return Err(Self::invalid(
                    "A mip generation target needs the RENDER_TARGET and READABLE_SHADER_RESOURCE bindings.",
                ));
            }
            if self.initial_data.is_some() {
                return Err(Self::invalid(
                    "A mip generation target can not be created with initial data.",
                ));
            }
        }
        if matches!(self.usage, Usage::Immutable | Usage::DiscardWrite) {
            if self.bindings.intersects(
                GpuBindings::RENDER_TARGET
                    | GpuBindings::DEPTH_STENCIL_TARGET
                    | GpuBindings::WRITABLE_SHADER_RESOURCE,
            ) {
                return Err(Self::invalid(format!(
                    "Textures with usage '{}' can not be render targets, depth targets or writable.",
                    self.usage
                )));
            }
            if self.bindings.is_empty() {
                return Err(Self::invalid(format!(
                    "A texture with usage '{}' and no GPU bindings can never be accessed.",
                    self.usage
                )));
            }
        }
        if self.usage.is_staging() && !self.bindings.is_empty() {
            return Err(Self::invalid(
                "Staging textures can not be bound to the pipeline.",
            ));
        }
        if self.usage == Usage::Immutable && self.initial_data.is_none() {
            return Err(Self::invalid(
                "Immutable textures must be created with initial data.",
            ));
        }
        if self.dynamic_detail_target && self.usage.is_staging() {
            return Err(Self::invalid(
                "Staging textures can not be dynamic detail targets.",
            ));
        }
        if self.multisampled && (self.mipmapped || self.initial_data.is_some()) {
            return Err(Self::invalid(
                "Multisampled textures can not have mips or initial data.",
            ));
        }
        if let Some(length) = array_length {
            if length == 0 {
                return Err(Self::invalid("Texture arrays must have at least one element."));
            }
            if self.usage == Usage::DiscardWrite {
                return Err(Self::invalid(
                    "Texture arrays can not have usage 'DiscardWrite'.",
                ));
            }
        }
        if let Some(data) = &self.initial_data {
            let expected = self.shape().texels_in_chain() * array_length.unwrap_or(1) as u64;
            if data.len() as u64 != expected {
                return Err(Self::invalid(format!(
                    "Initial data holds {} texels but the texture needs {expected}.",
                    data.len()
                )));
            }
        }
        Ok(())
    }

    fn create_native(&self, device: &Arc<Device>, array_size: u32) -> Result<crate::native::ResourceId> {
        let desc = TextureDesc {
            dimension: D::DIMENSION,
            width: self.width,
            height: self.height,
            depth: self.depth,
            array_size,
            mip_levels: self.num_mips(),
            texel_size: T::SIZE as u32,
            format: T::FORMAT,
            usage: self.usage,
            bindings: self.bindings,
            mip_generation_target: self.mip_generation_target,
            multisampled: self.multisampled,
            initial_data: self.initial_data.as_deref().map(elements_as_bytes),
        };
        device.native().create_texture(&desc).native("create_texture")
    }

    fn type_name() -> String {
        format!("{}<{}>", D::CLASS, short_type_name::<T>())
    }

    fn member_size(&self) -> u64 {
        self.shape().texels_in_chain() * T::SIZE as u64
    }

    pub(crate) fn create_inner(&self, device: &Arc<Device>) -> Result<TextureInner<T>> {
        self.validate(D::CLASS, None)?;
        let id = self.create_native(device, 1)?;
        let core = ResourceCore::new(
            device.clone(),
            id,
            D::CLASS,
            self.usage,
            self.bindings,
            self.member_size(),
            Self::type_name(),
            false,
        );
        Ok(TextureInner::new(core, self.shape(), 0, 1))
    }

    /// The array's own core and its members, in index order.
    pub(crate) fn create_members(
        &self,
        device: &Arc<Device>,
        array_class: ResourceClass,
        length: u32,
    ) -> Result<(ResourceCore, Vec<TextureInner<T>>)> {
        self.validate(array_class, Some(length))?;
        let id = self.create_native(device, length)?;
        let member_size = self.member_size();
        let shape = self.shape();
        let members = (0..length)
            .map(|index| {
                let core = ResourceCore::new(
                    device.clone(),
                    id,
                    D::CLASS,
                    self.usage,
                    self.bindings,
                    member_size,
                    Self::type_name(),
                    true,
                );
                TextureInner::new(core, shape, index, length)
            })
            .collect();
        let core = ResourceCore::new(
            device.clone(),
            id,
            array_class,
            self.usage,
            self.bindings,
            member_size * length as u64,
            format!("{array_class}<{}>", short_type_name::<T>()),
            false,
        );
        Ok((core, members))
    }
}

impl<T: Texel> TextureBuilder<T, D1> {
    pub fn new(width: u32) -> Self {
        Self::with_extents(width, 1, 1)
    }

    pub fn create(&self, device: &Arc<Device>) -> Result<Texture1D<T>> {
        self.create_inner(device).map(Texture1D::from_inner)
    }

    /// Creates an array of `length` textures sharing one native resource.
    pub fn create_array(&self, device: &Arc<Device>, length: u32) -> Result<Texture1DArray<T>> {
        let (core, members) = self.create_members(device, ResourceClass::Texture1DArray, length)?;
        Ok(Texture1DArray::from_parts(
            core,
            members.into_iter().map(Texture1D::from_inner).collect(),
        ))
    }
}

impl<T: Texel> TextureBuilder<T, D2> {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_extents(width, height, 1)
    }

    pub fn create(&self, device: &Arc<Device>) -> Result<Texture2D<T>> {
        self.create_inner(device).map(Texture2D::from_inner)
    }

    /// Creates an array of `length` textures sharing one native resource.
    pub fn create_array(&self, device: &Arc<Device>, length: u32) -> Result<Texture2DArray<T>> {
        let (core, members) = self.create_members(device, ResourceClass::Texture2DArray, length)?;
        Ok(Texture2DArray::from_parts(
            core,
            members.into_iter().map(Texture2D::from_inner).collect(),
        ))
    }
}

impl<T: Texel> TextureBuilder<T, D3> {
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self::with_extents(width, height, depth)
    }

    pub fn create(&self, device: &Arc<Device>) -> Result<Texture3D<T>> {
        self.create_inner(device).map(Texture3D::from_inner)
    }
}
