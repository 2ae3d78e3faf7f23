// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Live resource accounting, for leak diagnostics.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::capability::ResourceClass;

/// Number of live resources per [`ResourceClass`].
///
/// Owned by a [`Device`](crate::Device); created and torn down with it.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    counts: Mutex<BTreeMap<ResourceClass, u64>>,
}

impl ResourceRegistry {
    pub(crate) fn register(&self, class: ResourceClass) {
        *self.counts.lock().entry(class).or_insert(0) += 1;
    }

    pub(crate) fn unregister(&self, class: ResourceClass) {
        let mut counts = self.counts.lock();
        match counts.get_mut(&class) {
            Some(n) if *n > 0 => *n -= 1,
            _ => logwise::warn_sync!(
                "{class} disposed more times than it was created",
                class = logwise::privacy::LogIt(&class)
            ),
        }
    }

    pub fn live_count(&self, class: ResourceClass) -> u64 {
        self.counts.lock().get(&class).copied().unwrap_or(0)
    }

    /// Every class that has ever been registered, with its current count.
    pub fn snapshot(&self) -> Vec<(ResourceClass, u64)> {
        self.counts.lock().iter().map(|(c, n)| (*c, *n)).collect()
    }

    pub fn total(&self) -> u64 {
        self.counts.lock().values().sum()
    }

    pub(crate) fn log(&self) {
        let counts = self.counts.lock();
        logwise::info_sync!("Printing resource counts:");
        for (class, n) in counts.iter() {
            logwise::info_sync!(
                "\t{class}: {n}",
                class = logwise::privacy::LogIt(class),
                n = *n
            );
        }
    }
}
