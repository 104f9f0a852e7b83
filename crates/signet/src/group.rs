#![forbid(unsafe_code)]

//! Lifecycle management for a set of bindings.
//!
//! A [`BindingGroup`] collects bindings for one logical owner (a component, a
//! session, a plugin) so they can be torn down together. Bindings from
//! signals with different argument and return types can share a group.
//!
//! # Usage
//!
//! ```
//! use signet::{BindingGroup, Listener, Scope, Signal};
//!
//! let resized: Signal<(u16, u16)> = Signal::new();
//! let closed: Signal<()> = Signal::new();
//!
//! let mut group = BindingGroup::new();
//! group.hold(resized.add(Listener::unscoped(|(_w, _h)| {}), Scope::none())?);
//! group.hold(closed.add(Listener::unscoped(|()| {}), Scope::none())?);
//! assert_eq!(group.len(), 2);
//!
//! drop(group);
//! assert_eq!(resized.listener_count(), 0);
//! assert_eq!(closed.listener_count(), 0);
//! # Ok::<(), signet::SignalError>(())
//! ```
//!
//! # Invariants
//!
//! 1. Bindings are disposed in reverse registration order.
//! 2. After `clear()` or drop, no listener held by the group fires again.
//! 3. Bindings already disposed elsewhere are skipped.

use core::fmt;

use crate::binding::SignalBinding;
use crate::error::SignalError;

/// Something with a one-shot `dispose`.
pub trait Disposable {
    /// Release the resource. Fails if it was already disposed.
    fn dispose(&self) -> Result<(), SignalError>;

    /// Whether `dispose` has run.
    fn is_disposed(&self) -> bool;
}

impl<A, R> Disposable for SignalBinding<A, R> {
    fn dispose(&self) -> Result<(), SignalError> {
        SignalBinding::dispose(self)
    }

    fn is_disposed(&self) -> bool {
        SignalBinding::is_disposed(self)
    }
}

/// Disposes every held binding on `clear()` or drop.
pub struct BindingGroup {
    held: Vec<Box<dyn Disposable>>,
}

impl BindingGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self { held: Vec::new() }
    }

    /// Take responsibility for disposing `item`.
    pub fn hold(&mut self, item: impl Disposable + 'static) -> &mut Self {
        self.held.push(Box::new(item));
        self
    }

    /// Number of held bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Dispose everything now. The group is empty and reusable afterwards.
    ///
    /// Every binding is attempted; the first failure is returned.
    pub fn clear(&mut self) -> Result<(), SignalError> {
        let mut first_err = None;
        while let Some(item) = self.held.pop() {
            if item.is_disposed() {
                continue;
            }
            if let Err(err) = item.dispose() {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Default for BindingGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BindingGroup {
    fn drop(&mut self) {
        if let Err(err) = self.clear() {
            tracing::debug!(error = %err, "binding group dispose failed");
        }
    }
}

impl fmt::Debug for BindingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingGroup")
            .field("len", &self.held.len())
            .finish()
    }
}
