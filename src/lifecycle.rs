// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
State and lifecycle shared by every resource.

Each concrete resource embeds a [`ResourceCore`]. The core owns the native identity, the
instance lock and the disposed flag, and implements the rules common to all resources:

* creation registers the resource with its device's [`ResourceRegistry`](crate::registry::ResourceRegistry);
* mutations run under the instance lock and become logged no-ops once disposed;
* disposal releases the native resource exactly once.
*/

use std::fmt::Display;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::capability::{GpuBindings, Operation, ResourceClass, Usage};
use crate::device::Device;
use crate::error::{NativeResultExt, Result};
use crate::native::ResourceId;

/// What kind of manipulation was attempted, for disposed-resource warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Write,
    Read,
    CopyFrom,
    CopyTo,
    View,
}

impl Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Access::Write => "write",
            Access::Read => "read",
            Access::CopyFrom => "copy from",
            Access::CopyTo => "copy to",
            Access::View => "view",
        };
        f.write_str(s)
    }
}

/// Held while a resource is being mutated.
pub(crate) type InstanceGuard<'a> = MutexGuard<'a, bool>;

pub struct ResourceCore {
    device: Arc<Device>,
    id: ResourceId,
    class: ResourceClass,
    usage: Usage,
    bindings: GpuBindings,
    size: u64,
    type_name: String,
    array_member: bool,
    //the instance lock; true once disposed. Views observe it through the Arc.
    disposed: Arc<Mutex<bool>>,
}

impl ResourceCore {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        device: Arc<Device>,
        id: ResourceId,
        class: ResourceClass,
        usage: Usage,
        bindings: GpuBindings,
        size: u64,
        type_name: String,
        array_member: bool,
    ) -> Self {
        //array members share their array's identity and are counted through it
        if !array_member {
            device.registry().register(class);
            logwise::debuginternal_sync!(
                "created {type_name} {id} ({size} bytes, {usage})",
                type_name = type_name.clone(),
                id = logwise::privacy::LogIt(&id),
                size = size,
                usage = logwise::privacy::LogIt(&usage)
            );
        }
        ResourceCore {
            device,
            id,
            class,
            usage,
            bindings,
            size,
            type_name,
            array_member,
            disposed: Arc::new(Mutex::new(false)),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn bindings(&self) -> GpuBindings {
        self.bindings
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_array_member(&self) -> bool {
        self.array_member
    }

    pub fn is_disposed(&self) -> bool {
        *self.disposed.lock()
    }

    pub(crate) fn disposed_flag(&self) -> Arc<Mutex<bool>> {
        self.disposed.clone()
    }

    pub(crate) fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub(crate) fn check(&self, operation: Operation) -> Result<()> {
        self.usage.check(operation)
    }

    /**
    Takes the instance lock for a mutation.

    Returns `None`, after logging, when the resource has been disposed.
    */
    pub(crate) fn lock_live(&self, access: Access) -> Option<InstanceGuard<'_>> {
        let guard = self.disposed.lock();
        if *guard {
            self.warn_disposed(access);
            None
        } else {
            Some(guard)
        }
    }

    fn warn_disposed(&self, access: Access) {
        logwise::warn_sync!(
            "Attempted {access} manipulation on disposed resource of type: {type_name}",
            access = logwise::privacy::LogIt(&access),
            type_name = self.type_name.clone()
        );
    }

    /// Runs `f` under the instance lock, or does nothing if disposed.
    pub(crate) fn mutate<R>(
        &self,
        access: Access,
        f: impl FnOnce() -> Result<R>,
    ) -> Result<Option<R>> {
        match self.lock_live(access) {
            Some(_guard) => f().map(Some),
            None => Ok(None),
        }
    }

    /**
    Locks `self` (the copy source) and `dest` for a copy.

    Locks are taken in a fixed order so that opposing copies cannot deadlock. Members of one
    array share an id but not a lock, so the order falls back to the lock's address. When both
    cores share a lock it is taken once and `None` is returned for the second guard.
    */
    pub(crate) fn lock_pair<'a>(
        &'a self,
        dest: &'a ResourceCore,
    ) -> Option<(InstanceGuard<'a>, Option<InstanceGuard<'a>>)> {
        if std::ptr::eq(self, dest) || Arc::ptr_eq(&self.disposed, &dest.disposed) {
            return self.lock_live(Access::CopyFrom).map(|g| (g, None));
        }
        let src_first = self.lock_order() < dest.lock_order();
        let (first, second) = if src_first { (self, dest) } else { (dest, self) };
        let a = first.disposed.lock();
        let b = second.disposed.lock();
        let (src_guard, dst_guard) = if src_first { (a, b) } else { (b, a) };
        if *src_guard {
            self.warn_disposed(Access::CopyFrom);
            return None;
        }
        if *dst_guard {
            dest.warn_disposed(Access::CopyTo);
            return None;
        }
        Some((src_guard, Some(dst_guard)))
    }

    fn lock_order(&self) -> (ResourceId, usize) {
        (self.id, Arc::as_ptr(&self.disposed) as usize)
    }

    /**
    Releases the native resource.

    Idempotent. Array members refuse, because they share their array's identity.
    */
    pub(crate) fn dispose(&self) -> Result<()> {
        if self.array_member {
            logwise::warn_sync!(
                "Can not dispose an array-member-texture: You must dispose the array instead."
            );
            return Ok(());
        }
        let mut disposed = self.disposed.lock();
        if *disposed {
            return Ok(());
        }
        *disposed = true;
        let id = self.id;
        //queued behind any pending writes to this resource
        self.device
            .gateway()
            .run_blocking(move |native| native.release_resource(id))?
            .native("release_resource")?;
        self.device.registry().unregister(self.class);
        logwise::debuginternal_sync!(
            "disposed {type_name} {id}",
            type_name = self.type_name.clone(),
            id = logwise::privacy::LogIt(&self.id)
        );
        Ok(())
    }

    /// Marks an array member disposed when its array is disposed.
    pub(crate) fn mark_disposed(&self) {
        *self.disposed.lock() = true;
    }
}

impl std::fmt::Debug for ResourceCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCore")
            .field("id", &self.id)
            .field("type", &self.type_name)
            .field("usage", &self.usage)
            .field("bindings", &self.bindings)
            .field("size", &self.size)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Display for ResourceCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}", self.type_name, self.usage)?;
        if !self.bindings.is_empty() {
            write!(f, " + {}", self.bindings)?;
        }
        write!(f, ", {}B, ", self.size)?;
        if self.is_disposed() {
            f.write_str("disposed, ")?;
        }
        write!(f, "{}]", self.id)
    }
}

impl Drop for ResourceCore {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        if !self.array_member && !*self.disposed.lock() {
            logwise::warn_sync!(
                "Resource of type '{type_name}' was not disposed before it was dropped: {id}.",
                type_name = self.type_name.clone(),
                id = logwise::privacy::LogIt(&self.id)
            );
        }
    }
}

/**
The contract every resource shares.

Capability queries are pure functions of [`Usage`]; they never change after creation.
*/
pub trait Resource {
    #[doc(hidden)]
    fn core(&self) -> &ResourceCore;

    fn id(&self) -> ResourceId {
        self.core().id()
    }

    fn class(&self) -> ResourceClass {
        self.core().class()
    }

    fn usage(&self) -> Usage {
        self.core().usage()
    }

    fn permitted_bindings(&self) -> GpuBindings {
        self.core().bindings()
    }

    /// Total size in bytes, across every mip and array element.
    fn size(&self) -> u64 {
        self.core().size()
    }

    fn is_disposed(&self) -> bool {
        self.core().is_disposed()
    }

    fn can_discard_write(&self) -> bool {
        self.usage().can_discard_write()
    }

    fn can_write(&self) -> bool {
        self.usage().can_write()
    }

    fn can_read(&self) -> bool {
        self.usage().can_read()
    }

    fn can_read_write(&self) -> bool {
        self.usage().can_read_write()
    }

    fn can_be_copy_destination(&self) -> bool {
        self.usage().can_be_copy_destination()
    }

    /// Releases the native resource. Calling this more than once has no further effect.
    fn dispose(&self) -> Result<()> {
        self.core().dispose()
    }
}

pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    //keep generic arguments intact: only strip the path before the first '<'
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names() {
        assert_eq!(short_type_name::<f32>(), "f32");
        assert_eq!(
            short_type_name::<crate::pixel_formats::Rgba8Unorm>(),
            "Rgba8Unorm"
        );
        assert_eq!(short_type_name::<[f32; 4]>(), "[f32; 4]");
    }
}
