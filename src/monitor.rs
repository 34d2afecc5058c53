// SPDX-License-Identifier: GPL-3.0-only
//! Scoped monitor handle acquisition
//!
//! Handles are re-enumerated for each operation and never held open between
//! operations. [`MonitorHandles`] gives every handle back to its source when
//! dropped, so early returns and `?` on the error path release them too.

use crate::protocols::MonitorHandleSource;

/// Monitor handles borrowed from a [`MonitorHandleSource`] for one operation
pub struct MonitorHandles<'a, S: MonitorHandleSource> {
    source: &'a S,
    handles: Vec<S::Handle>,
}

impl<'a, S: MonitorHandleSource> MonitorHandles<'a, S> {
    pub fn new(source: &'a S, handles: Vec<S::Handle>) -> Self {
        Self { source, handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// The reference monitor capabilities are read from
    pub fn primary_mut(&mut self) -> Option<&mut S::Handle> {
        self.handles.first_mut()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, S::Handle> {
        self.handles.iter_mut()
    }
}

impl<S: MonitorHandleSource> Drop for MonitorHandles<'_, S> {
    fn drop(&mut self) {
        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            self.source.release(handle);
        }
        if count > 0 {
            trace!("Released {} monitor handle(s)", count);
        }
    }
}
