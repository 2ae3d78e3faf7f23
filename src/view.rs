// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Pipeline views over resources.

A view exposes a sub-range of a resource to one pipeline stage. It holds its own native view
handle and releases that on [`ResourceView::dispose`]; it never disposes the resource it refers to.
Views can be queried for whether their resource has since been disposed.
*/

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::capability::GpuBindings;
use crate::device::Device;
use crate::error::{Error, NativeResultExt, Result};
use crate::lifecycle::{Access, ResourceCore};
use crate::native::{ResourceId, ViewDesc, ViewId, ViewKind, ViewRange};
use crate::pixel_formats::ResourceFormat;

/// State common to every kind of view.
pub struct ResourceView {
    device: Arc<Device>,
    id: ViewId,
    resource: ResourceId,
    resource_disposed: Arc<Mutex<bool>>,
    resource_type: String,
    desc: ViewDesc,
    disposed: Mutex<bool>,
}

impl ResourceView {
    pub(crate) fn create(
        core: &ResourceCore,
        kind: ViewKind,
        format: ResourceFormat,
        range: ViewRange,
    ) -> Result<Self> {
        let required = match kind {
            ViewKind::ShaderResource => GpuBindings::READABLE_SHADER_RESOURCE,
            ViewKind::UnorderedAccess { .. } => GpuBindings::WRITABLE_SHADER_RESOURCE,
            ViewKind::RenderTarget => GpuBindings::RENDER_TARGET,
            ViewKind::DepthStencil => GpuBindings::DEPTH_STENCIL_TARGET,
        };
        if !core.bindings().contains(required) {
            return Err(Error::InvalidArgument(format!(
                "Can not create a {kind} to a resource that was created without the {required} binding."
            )));
        }
        //held until the native view exists, so a concurrent dispose waits for it
        let Some(_live) = core.lock_live(Access::View) else {
            return Err(Error::InvalidArgument(format!(
                "Can not create a {kind} to disposed resource of type: {}",
                core.type_name()
            )));
        };
        let desc = ViewDesc {
            kind,
            format,
            range,
        };
        let resource = core.id();
        let id = core
            .device()
            .gateway()
            .run_blocking(move |native| native.create_view(resource, &desc))?
            .native("create_view")?;
        logwise::debuginternal_sync!(
            "created {kind} {id} over {type_name}",
            kind = logwise::privacy::LogIt(&kind),
            id = id.raw(),
            type_name = core.type_name().to_string()
        );
        Ok(ResourceView {
            device: core.device().clone(),
            id,
            resource,
            resource_disposed: core.disposed_flag(),
            resource_type: core.type_name().to_string(),
            desc,
            disposed: Mutex::new(false),
        })
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The resource this view exposes.
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn kind(&self) -> ViewKind {
        self.desc.kind
    }

    pub fn format(&self) -> ResourceFormat {
        self.desc.format
    }

    pub fn range(&self) -> ViewRange {
        self.desc.range
    }

    pub fn is_disposed(&self) -> bool {
        *self.disposed.lock()
    }

    /// True once either this view or its resource has been disposed.
    pub fn resource_or_view_disposed(&self) -> bool {
        self.is_disposed() || *self.resource_disposed.lock()
    }

    /// Releases the native view. The resource is untouched.
    pub fn dispose(&self) -> Result<()> {
        let mut disposed = self.disposed.lock();
        if *disposed {
            return Ok(());
        }
        *disposed = true;
        let id = self.id;
        self.device
            .gateway()
            .run_blocking(move |native| native.release_view(id))?
            .native("release_view")
    }
}

impl std::fmt::Debug for ResourceView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceView")
            .field("id", &self.id.raw())
            .field("resource", &self.resource)
            .field("desc", &self.desc)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Drop for ResourceView {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        if !*self.disposed.lock() {
            logwise::warn_sync!(
                "Resource view over '{type_name}' was not disposed before it was dropped.",
                type_name = self.resource_type.clone()
            );
        }
    }
}

macro_rules! view_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(pub(crate) ResourceView);

        impl Deref for $name {
            type Target = ResourceView;
            fn deref(&self) -> &ResourceView {
                &self.0
            }
        }
    };
}

view_type!(
    /// Read-only shader access.
    ShaderResourceView
);
view_type!(
    /// Read-write shader access to a single mip (or an element range, for buffers).
    UnorderedAccessView
);
view_type!(RenderTargetView);
view_type!(DepthStencilView);

impl ShaderResourceView {
    /// `(first_mip, num_mips)` for texture views.
    pub fn mip_range(&self) -> Option<(u32, u32)> {
        match self.range() {
            ViewRange::Texture {
                first_mip,
                num_mips,
                ..
            } => Some((first_mip, num_mips)),
            ViewRange::Elements { .. } => None,
        }
    }
}

impl UnorderedAccessView {
    pub fn append_consume_support(&self) -> bool {
        matches!(
            self.kind(),
            ViewKind::UnorderedAccess {
                append_consume: true,
                ..
            }
        )
    }

    pub fn includes_counter(&self) -> bool {
        matches!(
            self.kind(),
            ViewKind::UnorderedAccess {
                include_counter: true,
                ..
            }
        )
    }

    /// Whether this is a raw (byte-address) view over a typed buffer.
    pub fn is_raw(&self) -> bool {
        matches!(self.kind(), ViewKind::UnorderedAccess { raw: true, .. })
    }
}

/// Validates a `[first, first + count)` range against `available`.
pub(crate) fn check_range(what: &str, first: u32, count: u32, available: u32) -> Result<()> {
    if count == 0 || first.checked_add(count).is_none_or(|end| end > available) {
        return Err(Error::InvalidArgument(format!(
            "{what} range {first}+{count} is empty or exceeds {available}"
        )));
    }
    Ok(())
}
