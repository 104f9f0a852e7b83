#![forbid(unsafe_code)]

//! Error types for signal and binding operations.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Use after dispose | `execute`/`detach`/`dispose` on a disposed binding | [`SignalError::UseAfterDispose`] |
//! | Signal disposed | `add`/`remove`/`dispatch`/`dispose` on a disposed signal | [`SignalError::SignalDisposed`] |
//! | Owner gone | Binding outlived every handle to its signal | [`SignalError::SignalDropped`] |
//! | Not attached | `remove`/`detach` for a listener the signal does not hold | [`SignalError::ListenerNotFound`] |
//! | Once mismatch | Listener re-added with the other once flag | [`SignalError::OnceConflict`] |
//!
//! Listener panics are never caught and never turned into a `SignalError`.

use core::fmt;

/// Errors from signal and binding lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// The binding has been disposed; its listener, scope and owner are gone.
    UseAfterDispose,
    /// The signal has been disposed and accepts no further operations.
    SignalDisposed,
    /// The signal owning this binding no longer exists.
    SignalDropped,
    /// The listener is not attached to the signal.
    ListenerNotFound,
    /// The listener is already attached with a different once flag.
    ///
    /// `once` is the flag of the existing registration.
    OnceConflict { once: bool },
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseAfterDispose => write!(f, "binding used after dispose"),
            Self::SignalDisposed => write!(f, "signal used after dispose"),
            Self::SignalDropped => write!(f, "owning signal was dropped"),
            Self::ListenerNotFound => write!(f, "listener is not attached to the signal"),
            Self::OnceConflict { once: true } => write!(
                f,
                "listener was added with add_once(); remove it before calling add()"
            ),
            Self::OnceConflict { once: false } => write!(
                f,
                "listener was added with add(); remove it before calling add_once()"
            ),
        }
    }
}

impl std::error::Error for SignalError {}

/// Errors from [`Signal::try_dispatch`](crate::Signal::try_dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError<E> {
    /// A signal or binding lifecycle error.
    Signal(SignalError),
    /// The first error returned by a listener. Later listeners did not run.
    Listener(E),
}

impl<E> From<SignalError> for DispatchError<E> {
    fn from(err: SignalError) -> Self {
        Self::Signal(err)
    }
}

impl<E: fmt::Display> fmt::Display for DispatchError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(err) => write!(f, "dispatch failed: {err}"),
            Self::Listener(err) => write!(f, "listener failed: {err}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for DispatchError<E> {}
