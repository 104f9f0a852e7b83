#![forbid(unsafe_code)]

//! Signal dispatcher owning an ordered list of listener bindings.
//!
//! # Design
//!
//! [`Signal<A, R>`] keeps its bindings in shared, reference-counted storage
//! (`Rc<SignalState<..>>`). Every [`SignalBinding`] it hands out holds only a
//! `Weak` back reference, so bindings never keep the signal alive.
//!
//! `dispatch` snapshots the binding list before calling anything, and no
//! `RefCell` borrow is held while a listener runs. Listeners may therefore
//! add, remove, detach, dispose or dispatch the same signal reentrantly.
//!
//! # Invariants
//!
//! 1. Bindings are executed in registration order.
//! 2. A binding removed during a dispatch is not executed later in that
//!    dispatch; a binding added during a dispatch waits for the next one.
//! 3. A listener is registered at most once per signal; re-adding it returns
//!    the existing binding.
//! 4. `halt()` only stops the innermost dispatch in progress.
//! 5. After `dispose()`, every mutating operation fails with
//!    [`SignalError::SignalDisposed`].
//!
//! # Failure Modes
//!
//! - **Listener panic**: propagates out of `dispatch`; bindings later in the
//!   order do not run for that dispatch.
//! - **Listener error** (`R = Result<T, E>`): ignored by `dispatch`, returned
//!   by [`Signal::try_dispatch`].

use core::fmt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::binding::SignalBinding;
use crate::error::{DispatchError, SignalError};
use crate::listener::{Listener, Scope};

/// Construction options for a [`Signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalConfig {
    /// Whether `dispatch` invokes listeners. Default: `true`.
    pub active: bool,
    /// Whether the last dispatched arguments are replayed to listeners added
    /// afterwards. Default: `false`.
    pub memorize: bool,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            active: true,
            memorize: false,
        }
    }
}

impl SignalConfig {
    /// Set whether the signal starts active.
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set whether the signal memorizes its last dispatch.
    #[must_use]
    pub fn memorize(mut self, memorize: bool) -> Self {
        self.memorize = memorize;
        self
    }
}

/// Clears the halt flag for one dispatch and restores the enclosing
/// dispatch's flag on exit, including unwinding out of a listener.
struct HaltGuard<'a> {
    halted: &'a Cell<bool>,
    outer: bool,
}

impl<'a> HaltGuard<'a> {
    fn enter(halted: &'a Cell<bool>) -> Self {
        let outer = halted.replace(false);
        Self { halted, outer }
    }
}

impl Drop for HaltGuard<'_> {
    fn drop(&mut self) {
        self.halted.set(self.outer);
    }
}

/// Shared interior for [`Signal<A, R>`].
pub(crate) struct SignalState<A, R> {
    bindings: RefCell<Vec<SignalBinding<A, R>>>,
    active: Cell<bool>,
    memorize: Cell<bool>,
    prev_args: RefCell<Option<A>>,
    halted: Cell<bool>,
    disposed: Cell<bool>,
}

/// An ordered registry of listener bindings with synchronous dispatch.
///
/// Cloning a `Signal` creates a new handle to the **same** registry.
///
/// `A` is the argument value handed to every listener (use a tuple for
/// several values); `R` is the listener return type.
pub struct Signal<A, R = ()> {
    state: Rc<SignalState<A, R>>,
}

impl<A, R> Clone for Signal<A, R> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<A, R> Default for Signal<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> fmt::Debug for Signal<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listener_count", &self.state.bindings.borrow().len())
            .field("active", &self.state.active.get())
            .field("memorize", &self.state.memorize.get())
            .field("disposed", &self.state.disposed.get())
            .finish()
    }
}

impl<A, R> Signal<A, R> {
    /// Create an empty, active, non-memorizing signal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    /// Create an empty signal with the given options.
    #[must_use]
    pub fn with_config(config: SignalConfig) -> Self {
        Self {
            state: Rc::new(SignalState {
                bindings: RefCell::new(Vec::new()),
                active: Cell::new(config.active),
                memorize: Cell::new(config.memorize),
                prev_args: RefCell::new(None),
                halted: Cell::new(false),
                disposed: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_state(state: Rc<SignalState<A, R>>) -> Self {
        Self { state }
    }

    pub(crate) fn downgrade(&self) -> std::rc::Weak<SignalState<A, R>> {
        Rc::downgrade(&self.state)
    }

    /// Whether both handles refer to the same signal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Remove the binding created for `listener`.
    ///
    /// The removed binding stays intact (it can still be inspected or
    /// disposed) but is no longer executed by this signal.
    ///
    /// Returns the listener that was removed.
    pub fn remove(&self, listener: &Listener<A, R>) -> Result<Listener<A, R>, SignalError> {
        self.ensure_live()?;
        let removed = {
            let mut bindings = self.state.bindings.borrow_mut();
            let index = bindings
                .iter()
                .position(|b| b.holds(listener))
                .ok_or(SignalError::ListenerNotFound)?;
            bindings.remove(index)
        };
        removed.set_attached(false);
        tracing::trace!(listener = %listener, "signal remove");
        Ok(listener.clone())
    }

    /// Remove every binding. Removed bindings stay intact.
    pub fn remove_all(&self) -> Result<(), SignalError> {
        self.ensure_live()?;
        self.clear_bindings();
        Ok(())
    }

    /// Whether `listener` is attached to this signal.
    #[must_use]
    pub fn has(&self, listener: &Listener<A, R>) -> bool {
        self.state.bindings.borrow().iter().any(|b| b.holds(listener))
    }

    /// Number of attached bindings.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.bindings.borrow().len()
    }

    /// Stop the dispatch in progress: bindings after the current one are
    /// skipped. Has no effect outside a dispatch.
    pub fn halt(&self) {
        self.state.halted.set(true);
    }

    /// Whether `dispatch` invokes listeners.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    /// Pause (`false`) or resume (`true`) dispatching.
    pub fn set_active(&self, active: bool) {
        self.state.active.set(active);
    }

    /// Whether the last dispatch is replayed to listeners added afterwards.
    #[must_use]
    pub fn is_memorize(&self) -> bool {
        self.state.memorize.get()
    }

    /// Enable or disable memorizing. Disabling does not forget stored
    /// arguments; call [`forget`](Self::forget) for that.
    pub fn set_memorize(&self, memorize: bool) {
        self.state.memorize.set(memorize);
    }

    /// Drop the memorized arguments, if any.
    pub fn forget(&self) {
        let prev = self.state.prev_args.borrow_mut().take();
        drop(prev);
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }

    /// Remove all bindings, forget memorized arguments and reject every
    /// further `add`, `remove`, `dispatch` and `dispose`.
    pub fn dispose(&self) -> Result<(), SignalError> {
        self.ensure_live()?;
        self.clear_bindings();
        self.forget();
        self.state.disposed.set(true);
        tracing::trace!("signal dispose");
        Ok(())
    }

    fn clear_bindings(&self) {
        let removed = std::mem::take(&mut *self.state.bindings.borrow_mut());
        for binding in &removed {
            binding.set_attached(false);
        }
        tracing::trace!(count = removed.len(), "signal remove_all");
    }

    fn ensure_live(&self) -> Result<(), SignalError> {
        if self.state.disposed.get() {
            Err(SignalError::SignalDisposed)
        } else {
            Ok(())
        }
    }
}

impl<A: Clone, R> Signal<A, R> {
    /// Attach `listener`, invoked with `scope` on every dispatch.
    ///
    /// If `listener` is already attached with [`add`](Self::add), the
    /// existing binding is returned. If it was attached with
    /// [`add_once`](Self::add_once), this fails with
    /// [`SignalError::OnceConflict`].
    pub fn add(
        &self,
        listener: Listener<A, R>,
        scope: Scope,
    ) -> Result<SignalBinding<A, R>, SignalError> {
        self.register(listener, false, scope)
    }

    /// Attach `listener` for a single dispatch. The binding detaches itself
    /// before the listener runs.
    pub fn add_once(
        &self,
        listener: Listener<A, R>,
        scope: Scope,
    ) -> Result<SignalBinding<A, R>, SignalError> {
        self.register(listener, true, scope)
    }

    fn register(
        &self,
        listener: Listener<A, R>,
        once: bool,
        scope: Scope,
    ) -> Result<SignalBinding<A, R>, SignalError> {
        self.ensure_live()?;
        let existing = self
            .state
            .bindings
            .borrow()
            .iter()
            .find(|b| b.holds(&listener))
            .cloned();
        let binding = match existing {
            Some(binding) if binding.is_once() != once => {
                return Err(SignalError::OnceConflict {
                    once: binding.is_once(),
                });
            }
            Some(binding) => binding,
            None => {
                tracing::trace!(listener = %listener, once, "signal add");
                let binding = SignalBinding::new(listener, once, scope, self.downgrade());
                self.state.bindings.borrow_mut().push(binding.clone());
                binding
            }
        };

        if self.state.memorize.get() {
            let prev = self.state.prev_args.borrow().clone();
            if let Some(args) = prev {
                binding.execute(args)?;
            }
        }
        Ok(binding)
    }

    /// Invoke every attached, enabled binding with a clone of `args`.
    ///
    /// Does nothing when the signal is inactive. Listener return values are
    /// discarded.
    pub fn dispatch(&self, args: A) -> Result<(), SignalError> {
        self.dispatch_with(args, |_| Ok::<(), SignalError>(()))
    }

    fn dispatch_with<X: From<SignalError>>(
        &self,
        args: A,
        mut inspect: impl FnMut(R) -> Result<(), X>,
    ) -> Result<(), X> {
        self.ensure_live()?;
        if !self.state.active.get() {
            tracing::trace!("signal inactive, dispatch skipped");
            return Ok(());
        }
        if self.state.memorize.get() {
            *self.state.prev_args.borrow_mut() = Some(args.clone());
        }

        let snapshot: Vec<SignalBinding<A, R>> = self.state.bindings.borrow().clone();
        tracing::trace!(count = snapshot.len(), "signal dispatch");

        let _halt = HaltGuard::enter(&self.state.halted);
        self.run(&snapshot, &args, &mut inspect)
    }

    fn run<X: From<SignalError>>(
        &self,
        snapshot: &[SignalBinding<A, R>],
        args: &A,
        inspect: &mut impl FnMut(R) -> Result<(), X>,
    ) -> Result<(), X> {
        for (index, binding) in snapshot.iter().enumerate() {
            // Removed by an earlier listener in this dispatch.
            if !binding.is_bound() {
                continue;
            }
            if let Some(value) = binding.execute(args.clone())? {
                inspect(value)?;
            }
            if self.state.halted.get() {
                tracing::debug!(
                    skipped = snapshot.len() - index - 1,
                    "signal dispatch halted"
                );
                break;
            }
        }
        Ok(())
    }
}

impl<A: Clone, T, E> Signal<A, Result<T, E>> {
    /// Like [`dispatch`](Self::dispatch), but stops at the first listener
    /// that returns `Err` and hands that error back.
    pub fn try_dispatch(&self, args: A) -> Result<(), DispatchError<E>> {
        self.dispatch_with(args, |value| value.map(drop).map_err(DispatchError::Listener))
    }
}
