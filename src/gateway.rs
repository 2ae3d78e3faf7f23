// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Thread affinity for native context calls.

The native context is single-threaded: calls that touch it must come from one owning thread.
[`DeviceThread`] owns that thread. Work is submitted as closures over a FIFO queue; the thread
runs them in receipt order, handing each the [`NativeDevice`].

Two submission styles exist:

* [`DeviceThread::run_blocking`] waits for the closure's result. Called on the device thread
  itself, it runs the closure inline rather than deadlocking on its own queue.
* [`DeviceThread::run_async`] returns immediately. Any error the closure reports is logged,
  since there is nobody left to return it to.

Jobs never take a resource's instance lock. A caller may therefore hold an instance lock while
it waits on the device thread.
*/

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use crate::error::{Error, Result};
use crate::native::NativeDevice;

type Job = Box<dyn FnOnce(&dyn NativeDevice) + Send + 'static>;

/// Settings for the device thread.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Name given to the OS thread.
    pub thread_name: String,
    /// Bounds the command queue. `None` is unbounded.
    pub queue_capacity: Option<usize>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            thread_name: "texels_and_buffers device".to_string(),
            queue_capacity: None,
        }
    }
}

impl DeviceConfig {
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }
}

/// The single thread that owns the native context.
pub struct DeviceThread {
    native: Arc<dyn NativeDevice>,
    //option so drop can close the queue before joining
    sender: Option<flume::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl std::fmt::Debug for DeviceThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceThread")
            .field("thread_id", &self.thread_id)
            .field(
                "pending",
                &self.sender.as_ref().map(|s| s.len()).unwrap_or(0),
            )
            .finish()
    }
}

impl DeviceThread {
    pub(crate) fn spawn(native: Arc<dyn NativeDevice>, config: &DeviceConfig) -> Result<Self> {
        let (sender, receiver) = match config.queue_capacity {
            Some(capacity) => flume::bounded::<Job>(capacity),
            None => flume::unbounded::<Job>(),
        };
        let worker_native = native.clone();
        let thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                logwise::debuginternal_sync!("device thread started");
                while let Ok(job) = receiver.recv() {
                    let native: &dyn NativeDevice = &*worker_native;
                    if std::panic::catch_unwind(AssertUnwindSafe(|| job(native))).is_err() {
                        logwise::error_sync!("a job panicked on the device thread");
                    }
                }
                logwise::debuginternal_sync!("device thread exiting");
            })
            .map_err(Error::GatewaySpawn)?;
        let thread_id = thread.thread().id();
        Ok(DeviceThread {
            native,
            sender: Some(sender),
            thread: Some(thread),
            thread_id,
        })
    }

    /// Whether the caller is running on the device thread.
    pub fn is_device_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    fn submit(&self, job: Job) -> Result<()> {
        self.sender
            .as_ref()
            .ok_or(Error::GatewayDisconnected)?
            .send(job)
            .map_err(|_| Error::GatewayDisconnected)
    }

    /**
    Runs `f` on the device thread and waits for its result.

    If `f` panics, or the device thread has stopped, this returns
    [`Error::GatewayDisconnected`] instead of waiting forever.
    */
    pub fn run_blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&dyn NativeDevice) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_device_thread() {
            return Ok(f(&*self.native));
        }
        let (reply, result) = flume::bounded(1);
        self.submit(Box::new(move |native| {
            //the caller may have given up; nothing to do then
            let _ = reply.send(f(native));
        }))?;
        result.recv().map_err(|_| Error::GatewayDisconnected)
    }

    /**
    Queues `f` on the device thread without waiting.

    An `Err` from `f` is logged with `what` as context.
    */
    pub fn run_async<F>(&self, what: &'static str, f: F) -> Result<()>
    where
        F: FnOnce(&dyn NativeDevice) -> Result<()> + Send + 'static,
    {
        let job: Job = Box::new(move |native| {
            if let Err(e) = f(native) {
                logwise::error_sync!(
                    "{what} failed on the device thread: {err}",
                    what = what.to_string(),
                    err = logwise::privacy::LogIt(&e)
                );
            }
        });
        if self.is_device_thread() {
            job(&*self.native);
            return Ok(());
        }
        self.submit(job)
    }

    /// Blocks until every job queued before this call has run.
    pub fn flush(&self) -> Result<()> {
        self.run_blocking(|_| ())
    }
}

impl Drop for DeviceThread {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == std::thread::current().id() {
                //dropped from inside one of our own jobs; the loop ends on its own
                return;
            }
            if thread.join().is_err() {
                logwise::error_sync!("device thread panicked during shutdown");
            }
        }
    }
}
