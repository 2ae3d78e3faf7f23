// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Declarative capability model.

A resource's [`Usage`] fixes, at creation, which CPU-side operations it supports. A resource's
[`GpuBindings`] fix which pipeline views may later be created over it. Each [`ResourceClass`]
carries an explicit table of the usages and bindings it accepts; builders check against these
tables before the native factory is ever called.
*/

use std::fmt::Display;

use crate::error::{Error, Result};

/// How the CPU intends to access a resource over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usage {
    /// Contents are supplied at creation and never change.
    Immutable,
    /// Whole-resource invalidating writes (`discard_write`), typically once per frame.
    DiscardWrite,
    /// Partial writes through the driver's update-region path.
    Write,
    /// CPU readback.
    StagingRead,
    /// CPU upload through map-write.
    StagingWrite,
    /// CPU readback and upload, including in-place read-write.
    StagingReadWrite,
}

impl Usage {
    pub const ALL: [Usage; 6] = [
        Usage::Immutable,
        Usage::DiscardWrite,
        Usage::Write,
        Usage::StagingRead,
        Usage::StagingWrite,
        Usage::StagingReadWrite,
    ];

    /**
    The native encoding of this usage.

    The low nibble is the driver usage class (`3` is staging); the upper bits are CPU access
    flags (`0x10000` write, `0x20000` read).
    */
    pub const fn raw(self) -> u32 {
        match self {
            Usage::Immutable => 0x1,
            Usage::DiscardWrite => 0x1_0002,
            Usage::Write => 0x0,
            Usage::StagingRead => 0x2_0003,
            Usage::StagingWrite => 0x1_0003,
            Usage::StagingReadWrite => 0x3_0003,
        }
    }

    pub const fn is_staging(self) -> bool {
        self.raw() & 0xF == 0x3
    }

    pub const fn should_map_read(self) -> bool {
        matches!(self, Usage::StagingRead | Usage::StagingReadWrite)
    }

    pub const fn should_map_write(self) -> bool {
        matches!(self, Usage::StagingWrite | Usage::StagingReadWrite)
    }

    pub const fn should_map_read_write(self) -> bool {
        matches!(self, Usage::StagingReadWrite)
    }

    pub const fn should_map_write_discard(self) -> bool {
        matches!(self, Usage::DiscardWrite)
    }

    /// Writes go through the driver's update-region call rather than map-write.
    pub const fn should_update_subresource_region(self) -> bool {
        matches!(self, Usage::Write)
    }

    pub const fn should_be_copy_resource_destination(self) -> bool {
        !matches!(self, Usage::Immutable)
    }

    pub const fn should_be_copy_subresource_region_destination(self) -> bool {
        !matches!(self, Usage::Immutable)
    }

    pub const fn can_discard_write(self) -> bool {
        self.should_map_write_discard()
    }

    pub const fn can_write(self) -> bool {
        self.should_map_write() || self.should_update_subresource_region()
    }

    pub const fn can_read(self) -> bool {
        self.should_map_read()
    }

    pub const fn can_read_write(self) -> bool {
        self.should_map_read_write()
    }

    pub const fn can_be_copy_destination(self) -> bool {
        self.should_be_copy_resource_destination()
            || self.should_be_copy_subresource_region_destination()
    }

    pub const fn permits(self, operation: Operation) -> bool {
        match operation {
            Operation::DiscardWrite => self.can_discard_write(),
            Operation::Write => self.can_write(),
            Operation::Read => self.can_read(),
            Operation::ReadWrite => self.can_read_write(),
            Operation::CopyDestination => self.can_be_copy_destination(),
        }
    }

    /// Returns [`Error::Capability`] unless `operation` is permitted.
    pub fn check(self, operation: Operation) -> Result<()> {
        if self.permits(operation) {
            Ok(())
        } else {
            Err(Error::Capability {
                operation,
                usage: self,
            })
        }
    }
}

impl Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Usage::Immutable => "Immutable",
            Usage::DiscardWrite => "DiscardWrite",
            Usage::Write => "Write",
            Usage::StagingRead => "StagingRead",
            Usage::StagingWrite => "StagingWrite",
            Usage::StagingReadWrite => "StagingReadWrite",
        };
        f.write_str(s)
    }
}

/// A CPU-side operation gated by [`Usage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DiscardWrite,
    Write,
    Read,
    ReadWrite,
    CopyDestination,
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // reads as "Can not <op> resource with usage ..."
        let s = match self {
            Operation::DiscardWrite => "discard-write to",
            Operation::Write => "write to",
            Operation::Read => "read from",
            Operation::ReadWrite => "read-write to",
            Operation::CopyDestination => "copy to",
        };
        f.write_str(s)
    }
}

bitflags::bitflags! {
    /// Pipeline binding points a resource may be exposed through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GpuBindings: u32 {
        const NONE = 0;
        const READABLE_SHADER_RESOURCE = 0x8;
        const RENDER_TARGET = 0x20;
        const DEPTH_STENCIL_TARGET = 0x40;
        const WRITABLE_SHADER_RESOURCE = 0x80;
    }
}

impl Display for GpuBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        bitflags::parser::to_writer(self, f)
    }
}

/// Every kind of resource this crate creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceClass {
    Buffer,
    VertexBuffer,
    IndexBuffer,
    ConstantBuffer,
    Texture1D,
    Texture2D,
    Texture3D,
    Texture1DArray,
    Texture2DArray,
}

const ALL_USAGES: &[Usage] = &Usage::ALL;
const PIPELINE_BUFFER_USAGES: &[Usage] = &[Usage::Immutable, Usage::DiscardWrite, Usage::Write];
const CONSTANT_BUFFER_USAGES: &[Usage] = &[Usage::Immutable, Usage::DiscardWrite];

const TEXTURE_BINDINGS: GpuBindings = GpuBindings::DEPTH_STENCIL_TARGET
    .union(GpuBindings::RENDER_TARGET)
    .union(GpuBindings::READABLE_SHADER_RESOURCE)
    .union(GpuBindings::WRITABLE_SHADER_RESOURCE);
const BUFFER_BINDINGS: GpuBindings =
    GpuBindings::READABLE_SHADER_RESOURCE.union(GpuBindings::WRITABLE_SHADER_RESOURCE);

impl ResourceClass {
    pub const ALL: [ResourceClass; 9] = [
        ResourceClass::Buffer,
        ResourceClass::VertexBuffer,
        ResourceClass::IndexBuffer,
        ResourceClass::ConstantBuffer,
        ResourceClass::Texture1D,
        ResourceClass::Texture2D,
        ResourceClass::Texture3D,
        ResourceClass::Texture1DArray,
        ResourceClass::Texture2DArray,
    ];

    pub const fn supported_usages(self) -> &'static [Usage] {
        match self {
            ResourceClass::VertexBuffer | ResourceClass::IndexBuffer => PIPELINE_BUFFER_USAGES,
            ResourceClass::ConstantBuffer => CONSTANT_BUFFER_USAGES,
            _ => ALL_USAGES,
        }
    }

    pub const fn supported_bindings(self) -> GpuBindings {
        match self {
            ResourceClass::Buffer => BUFFER_BINDINGS,
            ResourceClass::VertexBuffer
            | ResourceClass::IndexBuffer
            | ResourceClass::ConstantBuffer => GpuBindings::NONE,
            ResourceClass::Texture1D
            | ResourceClass::Texture2D
            | ResourceClass::Texture3D
            | ResourceClass::Texture1DArray
            | ResourceClass::Texture2DArray => TEXTURE_BINDINGS,
        }
    }

    pub fn supports_usage(self, usage: Usage) -> bool {
        self.supported_usages().contains(&usage)
    }

    pub fn supports_bindings(self, bindings: GpuBindings) -> bool {
        self.supported_bindings().contains(bindings)
    }

    pub(crate) fn check_usage(self, usage: Usage) -> Result<()> {
        if self.supports_usage(usage) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "Usage '{usage}' is not supported for resources of type '{self}'."
            )))
        }
    }

    pub(crate) fn check_bindings(self, bindings: GpuBindings) -> Result<()> {
        if self.supports_bindings(bindings) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "One or more GPU binding in the set '{bindings}' is not supported for resources of type '{self}'."
            )))
        }
    }

    pub const fn is_texture(self) -> bool {
        !self.is_buffer()
    }

    pub const fn is_buffer(self) -> bool {
        matches!(
            self,
            ResourceClass::Buffer
                | ResourceClass::VertexBuffer
                | ResourceClass::IndexBuffer
                | ResourceClass::ConstantBuffer
        )
    }
}

impl Display for ResourceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
