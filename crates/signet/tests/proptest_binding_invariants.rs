//! Model-based property tests for signal/binding lifecycles.

use proptest::prelude::*;
use signet::{Listener, Scope, Signal, SignalBinding, SignalError};
use std::cell::Cell;
use std::rc::Rc;

const SLOTS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    AddOnce(usize),
    Enable(usize),
    Disable(usize),
    Detach(usize),
    Dispose(usize),
    Dispatch,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..SLOTS).prop_map(Op::Add),
        (0..SLOTS).prop_map(Op::AddOnce),
        (0..SLOTS).prop_map(Op::Enable),
        (0..SLOTS).prop_map(Op::Disable),
        (0..SLOTS).prop_map(Op::Detach),
        (0..SLOTS).prop_map(Op::Dispose),
        Just(Op::Dispatch),
    ]
}

/// Expected state of the most recent binding for one listener.
#[derive(Default)]
struct Slot {
    binding: Option<SignalBinding<()>>,
    /// `Some(once)` while attached.
    attached: Option<bool>,
    enabled: bool,
    disposed: bool,
    calls: u32,
}

struct Harness {
    signal: Signal<()>,
    listeners: Vec<Listener<()>>,
    counters: Vec<Rc<Cell<u32>>>,
    slots: Vec<Slot>,
}

impl Harness {
    fn new() -> Self {
        let counters: Vec<Rc<Cell<u32>>> = (0..SLOTS).map(|_| Rc::new(Cell::new(0))).collect();
        let listeners = counters
            .iter()
            .map(|c| {
                let c = Rc::clone(c);
                Listener::unscoped(move |()| c.set(c.get() + 1))
            })
            .collect();
        Self {
            signal: Signal::new(),
            listeners,
            counters,
            slots: (0..SLOTS).map(|_| Slot::default()).collect(),
        }
    }

    fn add(&mut self, i: usize, once: bool) -> Result<(), TestCaseError> {
        let listener = self.listeners[i].clone();
        let result = if once {
            self.signal.add_once(listener, Scope::none())
        } else {
            self.signal.add(listener, Scope::none())
        };
        let slot = &mut self.slots[i];
        match slot.attached {
            Some(existing) if existing != once => {
                prop_assert_eq!(
                    result.err(),
                    Some(SignalError::OnceConflict { once: existing })
                );
            }
            Some(_) => {
                let binding = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
                let same = slot.binding.as_ref().is_some_and(|b| b.ptr_eq(&binding));
                prop_assert!(same, "re-add must return the existing binding");
            }
            None => {
                let binding = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
                *slot = Slot {
                    binding: Some(binding),
                    attached: Some(once),
                    enabled: true,
                    disposed: false,
                    calls: slot.calls,
                };
            }
        }
        Ok(())
    }

    fn apply(&mut self, op: &Op) -> Result<(), TestCaseError> {
        match *op {
            Op::Add(i) => self.add(i, false)?,
            Op::AddOnce(i) => self.add(i, true)?,
            Op::Enable(i) | Op::Disable(i) => {
                let on = matches!(op, Op::Enable(_));
                let slot = &mut self.slots[i];
                if let Some(b) = &slot.binding {
                    if on {
                        b.enable();
                    } else {
                        b.disable();
                    }
                    slot.enabled = on;
                    prop_assert_eq!(b.is_enabled(), on);
                }
            }
            Op::Detach(i) => {
                let slot = &mut self.slots[i];
                if let Some(b) = &slot.binding {
                    let result = b.detach();
                    if slot.disposed {
                        prop_assert_eq!(result, Err(SignalError::UseAfterDispose));
                    } else if slot.attached.is_some() {
                        prop_assert_eq!(result, Ok(self.listeners[i].clone()));
                        slot.attached = None;
                    } else {
                        prop_assert_eq!(result, Err(SignalError::ListenerNotFound));
                    }
                }
            }
            Op::Dispose(i) => {
                let slot = &mut self.slots[i];
                if let Some(b) = &slot.binding {
                    let result = b.dispose();
                    if slot.disposed {
                        prop_assert_eq!(result, Err(SignalError::UseAfterDispose));
                    } else {
                        prop_assert_eq!(result, Ok(()));
                        slot.attached = None;
                        slot.disposed = true;
                    }
                }
            }
            Op::Dispatch => {
                self.signal
                    .dispatch(())
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                for slot in &mut self.slots {
                    let Some(once) = slot.attached else { continue };
                    if !slot.enabled {
                        continue;
                    }
                    slot.calls += 1;
                    if once {
                        slot.attached = None;
                    }
                }
            }
        }
        Ok(())
    }

    fn check(&self) -> Result<(), TestCaseError> {
        let mut attached = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            prop_assert_eq!(self.counters[i].get(), slot.calls);
            prop_assert_eq!(self.signal.has(&self.listeners[i]), slot.attached.is_some());
            if let Some(b) = &slot.binding {
                prop_assert_eq!(b.is_bound(), slot.attached.is_some());
                prop_assert_eq!(b.is_disposed(), slot.disposed);
            }
            attached += usize::from(slot.attached.is_some());
        }
        prop_assert_eq!(self.signal.listener_count(), attached);
        Ok(())
    }
}

proptest! {
    #[test]
    fn lifecycle_matches_model(ops in prop::collection::vec(op(), 1..64)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op)?;
            harness.check()?;
        }
    }

    #[test]
    fn disabled_execute_never_invokes(args in prop::collection::vec(any::<i64>(), 0..16)) {
        let signal: Signal<Vec<i64>, usize> = Signal::new();
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let binding = signal
            .add(Listener::unscoped(move |v: Vec<i64>| { c.set(c.get() + 1); v.len() }), Scope::none())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        binding.disable();
        prop_assert_eq!(binding.execute(args.clone()), Ok(None));
        signal.dispatch(args).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(calls.get(), 0);
    }

    #[test]
    fn setters_are_idempotent(toggles in prop::collection::vec(any::<bool>(), 1..32)) {
        let signal: Signal<()> = Signal::new();
        let binding = signal
            .add(Listener::unscoped(|()| {}), Scope::none())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        for on in toggles {
            if on { binding.enable() } else { binding.disable() }
            prop_assert_eq!(binding.is_enabled(), on);
        }
        prop_assert!(!binding.is_once());
    }
}
