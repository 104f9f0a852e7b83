#![forbid(unsafe_code)]

//! The attachment of one listener to one [`Signal`].
//!
//! A [`SignalBinding<A, R>`] is created by [`Signal::add`] or
//! [`Signal::add_once`] and is the handle through which a single
//! registration is paused, resumed, detached or torn down.
//!
//! # Lifecycle
//!
//! ```text
//! attached ──detach()──▶ detached (intact) ──dispose()──▶ disposed
//!    │                                                      ▲
//!    └──────────────────────dispose()───────────────────────┘
//! ```
//!
//! Disposed is terminal: the listener, scope and owner reference are
//! released and every further `execute`, `detach` or `dispose` fails with
//! [`SignalError::UseAfterDispose`].
//!
//! # Invariants
//!
//! 1. `is_once()` never changes after construction.
//! 2. A once-only binding is detached *before* its listener runs, so a
//!    nested dispatch of the same signal never reaches it again, and a
//!    panicking listener still leaves it detached.
//! 3. `execute` reads the enabled flag exactly once, on entry.
//! 4. The binding holds a `Weak` reference to its signal and never keeps it
//!    alive.
//! 5. `detach()` returns the exact listener the binding was created with.
//!
//! # Failure Modes
//!
//! | Call | Condition | Result |
//! |------|-----------|--------|
//! | `execute` | disposed | `Err(UseAfterDispose)` |
//! | `execute` | disabled | `Ok(None)`, listener not invoked |
//! | `execute` | once-only and already detached | `Err(ListenerNotFound)`, listener not invoked |
//! | `detach` | disposed | `Err(UseAfterDispose)` |
//! | `detach` | signal dropped | `Err(SignalDropped)` |
//! | `detach` | already detached | `Err(ListenerNotFound)` |
//! | `dispose` | disposed | `Err(UseAfterDispose)` |

use core::fmt;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::SignalError;
use crate::listener::{Listener, Scope};
use crate::signal::{Signal, SignalState};

/// References released by `dispose`.
struct Parts<A, R> {
    listener: Listener<A, R>,
    scope: Scope,
    owner: Weak<SignalState<A, R>>,
}

struct BindingInner<A, R> {
    parts: RefCell<Option<Parts<A, R>>>,
    once: bool,
    enabled: Cell<bool>,
    /// Cleared by the owning signal when it drops this binding from its list.
    attached: Cell<bool>,
}

/// One listener's registration on one [`Signal`].
///
/// Cloning a `SignalBinding` creates a new handle to the **same**
/// registration; the signal itself holds one such handle while attached.
pub struct SignalBinding<A, R = ()> {
    inner: Rc<BindingInner<A, R>>,
}

impl<A, R> Clone for SignalBinding<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A, R> SignalBinding<A, R> {
    pub(crate) fn new(
        listener: Listener<A, R>,
        once: bool,
        scope: Scope,
        owner: Weak<SignalState<A, R>>,
    ) -> Self {
        Self {
            inner: Rc::new(BindingInner {
                parts: RefCell::new(Some(Parts {
                    listener,
                    scope,
                    owner,
                })),
                once,
                enabled: Cell::new(true),
                attached: Cell::new(true),
            }),
        }
    }

    /// Invoke the listener with the bound scope and `args`.
    ///
    /// Returns `Ok(None)` without invoking anything when the binding is
    /// disabled. A once-only binding detaches itself first; if that fails
    /// the listener is not invoked.
    ///
    /// # Panics
    ///
    /// Panics raised by the listener propagate unchanged.
    pub fn execute(&self, args: A) -> Result<Option<R>, SignalError> {
        let (listener, scope) = {
            let parts = self.inner.parts.borrow();
            let parts = parts.as_ref().ok_or(SignalError::UseAfterDispose)?;
            (parts.listener.clone(), parts.scope.clone())
        };
        if !self.inner.enabled.get() {
            return Ok(None);
        }
        if self.inner.once {
            self.detach()?;
        }
        Ok(Some(listener.call(&scope, args)))
    }

    /// Remove this binding from its signal, returning the listener.
    ///
    /// The binding stays intact and can still be inspected or disposed.
    pub fn detach(&self) -> Result<Listener<A, R>, SignalError> {
        let (listener, owner) = {
            let parts = self.inner.parts.borrow();
            let parts = parts.as_ref().ok_or(SignalError::UseAfterDispose)?;
            (parts.listener.clone(), parts.owner.clone())
        };
        let signal = owner
            .upgrade()
            .map(Signal::from_state)
            .ok_or(SignalError::SignalDropped)?;
        // The signal may hold a newer binding for the same listener.
        if !self.inner.attached.get() {
            return Err(SignalError::ListenerNotFound);
        }
        signal.remove(&listener)
    }

    /// Detach (if still attached) and release the listener, scope and
    /// signal reference. One-shot: a second call fails with
    /// [`SignalError::UseAfterDispose`].
    ///
    /// A binding that was already detached, or whose signal has been
    /// dropped, can still be disposed: `ListenerNotFound` and
    /// `SignalDropped` from the internal detach are not reported.
    pub fn dispose(&self) -> Result<(), SignalError> {
        match self.detach() {
            Ok(_) | Err(SignalError::ListenerNotFound | SignalError::SignalDropped) => {}
            Err(err) => return Err(err),
        }
        let parts = self.inner.parts.borrow_mut().take();
        self.inner.attached.set(false);
        tracing::trace!(once = self.inner.once, "binding dispose");
        drop(parts);
        Ok(())
    }

    /// Resume execution.
    pub fn enable(&self) {
        self.inner.enabled.set(true);
    }

    /// Pause execution; `execute` becomes a no-op until re-enabled.
    pub fn disable(&self) {
        self.inner.enabled.set(false);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    #[must_use]
    pub fn is_once(&self) -> bool {
        self.inner.once
    }

    /// Whether the binding is still attached to a live signal.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.attached.get()
            && self
                .inner
                .parts
                .borrow()
                .as_ref()
                .is_some_and(|p| p.owner.strong_count() > 0)
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.parts.borrow().is_none()
    }

    /// The bound listener, or `None` once disposed.
    #[must_use]
    pub fn listener(&self) -> Option<Listener<A, R>> {
        self.inner.parts.borrow().as_ref().map(|p| p.listener.clone())
    }

    /// The bound scope, or `None` once disposed.
    #[must_use]
    pub fn scope(&self) -> Option<Scope> {
        self.inner.parts.borrow().as_ref().map(|p| p.scope.clone())
    }

    /// The owning signal, if it is still alive and the binding not disposed.
    #[must_use]
    pub fn signal(&self) -> Option<Signal<A, R>> {
        self.inner
            .parts
            .borrow()
            .as_ref()
            .and_then(|p| p.owner.upgrade())
            .map(Signal::from_state)
    }

    /// Whether both handles refer to the same registration.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn holds(&self, listener: &Listener<A, R>) -> bool {
        self.inner
            .parts
            .borrow()
            .as_ref()
            .is_some_and(|p| p.listener == *listener)
    }

    pub(crate) fn set_attached(&self, attached: bool) {
        self.inner.attached.set(attached);
    }
}

impl<A, R> fmt::Display for SignalBinding<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[SignalBinding once:{}, enabled:{}",
            self.inner.once,
            self.inner.enabled.get()
        )?;
        match self.inner.parts.borrow().as_ref() {
            Some(p) => write!(f, ", listener:{}, scope:{}]", p.listener, p.scope),
            None => write!(f, ", disposed]"),
        }
    }
}

impl<A, R> fmt::Debug for SignalBinding<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.inner.parts.borrow();
        f.debug_struct("SignalBinding")
            .field("once", &self.inner.once)
            .field("enabled", &self.inner.enabled.get())
            .field("attached", &self.inner.attached.get())
            .field("listener", &parts.as_ref().map(|p| p.listener.id()))
            .field("scope", &parts.as_ref().map(|p| p.scope.type_name()))
            .finish()
    }
}
