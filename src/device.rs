// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The device: one native driver, its owning thread, and the live-resource registry.

Every resource holds an `Arc<Device>`, so the device thread outlives all resources created on it.
*/

use std::sync::Arc;

use crate::capability::ResourceClass;
use crate::error::Result;
use crate::gateway::{DeviceConfig, DeviceThread};
use crate::native::NativeDevice;
use crate::registry::ResourceRegistry;

#[derive(Debug)]
pub struct Device {
    native: Arc<dyn NativeDevice>,
    gateway: DeviceThread,
    registry: ResourceRegistry,
}

impl Device {
    /// Starts a device thread for `native`.
    pub fn new(native: Arc<dyn NativeDevice>) -> Result<Arc<Device>> {
        Self::with_config(native, DeviceConfig::default())
    }

    pub fn with_config(native: Arc<dyn NativeDevice>, config: DeviceConfig) -> Result<Arc<Device>> {
        let gateway = DeviceThread::spawn(native.clone(), &config)?;
        logwise::debuginternal_sync!(
            "device started on thread '{name}'",
            name = config.thread_name.clone()
        );
        Ok(Arc::new(Device {
            native,
            gateway,
            registry: ResourceRegistry::default(),
        }))
    }

    /// Direct access for free-threaded calls.
    pub fn native(&self) -> &dyn NativeDevice {
        &*self.native
    }

    pub fn gateway(&self) -> &DeviceThread {
        &self.gateway
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Live resources of `class` created on this device.
    pub fn live_count(&self, class: ResourceClass) -> u64 {
        self.registry.live_count(class)
    }

    pub fn live_counts(&self) -> Vec<(ResourceClass, u64)> {
        self.registry.snapshot()
    }

    /// Writes the per-class live counts to the log at info level.
    pub fn log_live_counts(&self) {
        self.registry.log();
    }

    /// Waits for every queued device-thread job, including pending async writes.
    pub fn flush(&self) -> Result<()> {
        self.gateway.flush()
    }
}
