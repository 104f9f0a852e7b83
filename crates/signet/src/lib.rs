#![forbid(unsafe_code)]

//! Synchronous signals with detachable listener bindings.
//!
//! - [`Signal`]: an ordered registry of listeners, dispatched synchronously
//!   with a caller-supplied argument value.
//! - [`SignalBinding`]: one listener's registration on one signal. Can be
//!   paused, made once-only, detached and disposed.
//! - [`Listener`] / [`Scope`]: an identity-comparable callable and the
//!   receiver it is invoked with.
//! - [`BindingGroup`]: RAII guard that disposes a set of bindings together.
//!
//! # Example
//!
//! ```
//! use signet::{Listener, Scope, Signal};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let clicked: Signal<(i32, i32)> = Signal::new();
//! let total = Rc::new(Cell::new(0));
//!
//! let t = Rc::clone(&total);
//! let binding = clicked.add(Listener::unscoped(move |(x, y)| t.set(t.get() + x + y)), Scope::none())?;
//!
//! clicked.dispatch((1, 2))?;
//! binding.disable();
//! clicked.dispatch((10, 20))?;
//! assert_eq!(total.get(), 3);
//!
//! binding.dispose()?;
//! assert_eq!(clicked.listener_count(), 0);
//! # Ok::<(), signet::SignalError>(())
//! ```
//!
//! # Architecture
//!
//! Signals and bindings are `Rc`-backed handles for single-threaded use.
//! A signal holds strong handles to its bindings; bindings point back to
//! their signal through a `Weak`, so dropping the last signal handle frees
//! the registry even while bindings are still held elsewhere.

pub mod binding;
pub mod error;
pub mod group;
pub mod listener;
pub mod signal;

pub use binding::SignalBinding;
pub use error::{DispatchError, SignalError};
pub use group::{BindingGroup, Disposable};
pub use listener::{Listener, Scope};
pub use signal::{Signal, SignalConfig};
