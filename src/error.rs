// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Error types for resource operations.

use crate::capability::{Operation, Usage};

/// Errors returned by resource creation and access.
///
/// Access to a disposed resource is not represented here: it logs a warning
/// and completes as a no-op.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource's usage does not permit the requested operation.
    ///
    /// Always returned before any native call is made.
    #[error("Can not {operation} resource with usage '{usage}'.")]
    Capability { operation: Operation, usage: Usage },
    /// A mip, array, element or texel range falls outside the resource.
    #[error("out of bounds: {0}")]
    Bounds(String),
    /// A builder or view parameter violates the rules for the resource class.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The native driver reported a failure.
    #[error("native call {call} failed: {message}")]
    NativeOperationFailure { call: &'static str, message: String },
    /// The device thread is gone, or the job submitted to it panicked.
    #[error("the device thread is not available")]
    GatewayDisconnected,
    /// The device thread could not be spawned.
    #[error("could not start the device thread")]
    GatewaySpawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`NativeDevice`](crate::native::NativeDevice) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NativeError {
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        NativeError {
            message: message.into(),
        }
    }
}

/// Attaches the originating call name to a native failure.
pub(crate) trait NativeResultExt<T> {
    fn native(self, call: &'static str) -> Result<T>;
}

impl<T> NativeResultExt<T> for std::result::Result<T, NativeError> {
    fn native(self, call: &'static str) -> Result<T> {
        self.map_err(|e| Error::NativeOperationFailure {
            call,
            message: e.message,
        })
    }
}
