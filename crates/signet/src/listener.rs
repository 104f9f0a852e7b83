#![forbid(unsafe_code)]

//! Listener callables and the scope they are invoked with.
//!
//! A [`Listener<A, R>`] is a shared, identity-comparable callable. Two
//! listeners are equal only when they are clones of the same handle, which is
//! what lets a [`Signal`](crate::Signal) find and remove the binding created
//! for it.
//!
//! A [`Scope`] is the receiver handed to the listener on every call. It is an
//! opaque, possibly empty handle; listeners recover the concrete value with
//! [`Scope::downcast_ref`].
//!
//! # Invariants
//!
//! 1. `a == b` iff `a` and `b` share the same allocation (clones are equal).
//! 2. Two separately constructed listeners are never equal, even when built
//!    from identical closures.
//! 3. Cloning a `Scope` shares the underlying value.

use core::fmt;
use std::any::Any;
use std::rc::Rc;

/// A shared listener callable taking a scope and an argument value.
pub struct Listener<A, R = ()> {
    f: Rc<dyn Fn(&Scope, A) -> R>,
}

impl<A, R> Clone for Listener<A, R> {
    fn clone(&self) -> Self {
        Self {
            f: Rc::clone(&self.f),
        }
    }
}

impl<A: 'static, R: 'static> Listener<A, R> {
    /// Wrap `f` into a new listener with its own identity.
    pub fn new(f: impl Fn(&Scope, A) -> R + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    /// Wrap a closure that ignores its scope.
    pub fn unscoped(f: impl Fn(A) -> R + 'static) -> Self {
        Self::new(move |_scope: &Scope, args| f(args))
    }
}

impl<A, R> Listener<A, R> {
    /// Invoke the listener with `scope` as receiver.
    pub fn call(&self, scope: &Scope, args: A) -> R {
        (self.f)(scope, args)
    }

    /// Stable identity of this listener, shared by all its clones.
    #[must_use]
    pub fn id(&self) -> usize {
        self.addr() as usize
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.f).cast::<()>()
    }
}

impl<A, R> PartialEq for Listener<A, R> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.addr(), other.addr())
    }
}

impl<A, R> Eq for Listener<A, R> {}

impl<A, R> fmt::Debug for Listener<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:#x})", self.id())
    }
}

impl<A, R> fmt::Display for Listener<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.id())
    }
}

/// Opaque receiver value passed to a listener.
///
/// May be empty ([`Scope::none`]).
#[derive(Clone)]
pub struct Scope {
    value: Option<Rc<dyn Any>>,
    type_name: &'static str,
}

impl Scope {
    /// An empty scope.
    #[must_use]
    pub fn none() -> Self {
        Self {
            value: None,
            type_name: "none",
        }
    }

    /// A scope owning `value`.
    pub fn new<T: 'static>(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    /// A scope sharing an existing `Rc`.
    pub fn from_rc<T: 'static>(value: Rc<T>) -> Self {
        Self {
            value: Some(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether the scope carries no value.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the scope value as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Clone out the shared `Rc<T>`, if the scope holds a `T`.
    #[must_use]
    pub fn downcast_rc<T: 'static>(&self) -> Option<Rc<T>> {
        self.value.clone().and_then(|v| v.downcast::<T>().ok())
    }

    /// Type name of the stored value, or `"none"`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both scopes share the same value. Two empty scopes are equal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (Some(a), Some(b)) => {
                core::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
