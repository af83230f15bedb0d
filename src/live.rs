//! Lock-free sharing of a compiled pattern.
//!
//! A `StepTable` is immutable once compiled, so concurrent matching needs no
//! synchronization at all; only replacing the table under running matchers
//! does. `LivePattern` keeps the current table behind an `ArcSwap`: readers
//! snapshot it without locking, writers compile the replacement under a mutex
//! and publish it atomically. In-flight steppers keep driving the snapshot
//! they started with; state indices from one table mean nothing in another.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::compile::compile;
use crate::table::StepTable;
use crate::CompileError;

/// A compiled pattern that can be re-pointed at a new pattern while matcher
/// threads keep stepping.
pub struct LivePattern {
    current: ArcSwap<StepTable>,
    /// Serializes writers so two concurrent swaps cannot publish out of
    /// compile order. Readers never take it.
    publish: Mutex<()>,
}

impl LivePattern {
    /// Compile `pattern` and wrap the table for shared use.
    pub fn new(pattern: &str) -> Result<Self, CompileError> {
        let table = compile(pattern)?;
        Ok(Self {
            current: ArcSwap::from_pointee(table),
            publish: Mutex::new(()),
        })
    }

    /// Snapshot the current table. The snapshot stays valid (and unchanged)
    /// however many swaps happen afterwards.
    pub fn load(&self) -> Arc<StepTable> {
        self.current.load_full()
    }

    /// Compile `pattern` and publish it as the new table. On error the
    /// current table stays in place.
    pub fn swap(&self, pattern: &str) -> Result<(), CompileError> {
        let _guard = self.publish.lock();
        let table = compile(pattern)?;
        self.current.store(Arc::new(table));
        Ok(())
    }
}
