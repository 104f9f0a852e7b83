#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use signet::{Listener, Scope, Signal, SignalBinding, SignalError};
use std::cell::RefCell;
use std::rc::Rc;

const SLOTS: usize = 6;
const MAX_DEPTH: u8 = 3;

/// What a listener does when it fires.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum Reaction {
    Nothing,
    Halt,
    Redispatch,
    Remove(u8),
    DisposeSelf,
    Disable(u8),
}

#[derive(Arbitrary, Debug)]
enum Op {
    Add { slot: u8, once: bool, reaction: Reaction },
    Enable(u8),
    Disable(u8),
    Detach(u8),
    Dispose(u8),
    Execute(u8),
    Dispatch,
    SetActive(bool),
    RemoveAll,
}

type Bindings = Rc<RefCell<Vec<Option<SignalBinding<u8>>>>>;

fn make_listener(
    signal: &Signal<u8>,
    bindings: &Bindings,
    listeners: &Rc<RefCell<Vec<Option<Listener<u8>>>>>,
    slot: usize,
    reaction: Reaction,
) -> Listener<u8> {
    let signal = signal.clone();
    let bindings = Rc::clone(bindings);
    let listeners = Rc::clone(listeners);
    Listener::unscoped(move |depth: u8| {
        match reaction {
            Reaction::Nothing => {}
            Reaction::Halt => signal.halt(),
            Reaction::Redispatch => {
                if depth < MAX_DEPTH {
                    let _ = signal.dispatch(depth + 1);
                }
            }
            Reaction::Remove(other) => {
                let other = listeners.borrow()[usize::from(other) % SLOTS].clone();
                if let Some(l) = other {
                    let _ = signal.remove(&l);
                }
            }
            Reaction::DisposeSelf => {
                let me = bindings.borrow()[slot].clone();
                if let Some(b) = me {
                    let _ = b.dispose();
                }
            }
            Reaction::Disable(other) => {
                let other = bindings.borrow()[usize::from(other) % SLOTS].clone();
                if let Some(b) = other {
                    b.disable();
                }
            }
        }
    })
}

fuzz_target!(|ops: Vec<Op>| {
    let signal: Signal<u8> = Signal::new();
    let bindings: Bindings = Rc::new(RefCell::new(vec![None; SLOTS]));
    let listeners = Rc::new(RefCell::new(vec![None; SLOTS]));

    for op in ops.iter().take(256) {
        let pick = |s: u8| bindings.borrow()[usize::from(s) % SLOTS].clone();
        match *op {
            Op::Add { slot, once, reaction } => {
                let slot = usize::from(slot) % SLOTS;
                let listener = make_listener(&signal, &bindings, &listeners, slot, reaction);
                let result = if once {
                    signal.add_once(listener.clone(), Scope::none())
                } else {
                    signal.add(listener.clone(), Scope::none())
                };
                if let Ok(b) = result {
                    bindings.borrow_mut()[slot] = Some(b);
                    listeners.borrow_mut()[slot] = Some(listener);
                }
            }
            Op::Enable(s) => {
                if let Some(b) = pick(s) {
                    b.enable();
                    assert!(b.is_enabled());
                }
            }
            Op::Disable(s) => {
                if let Some(b) = pick(s) {
                    b.disable();
                    assert!(!b.is_enabled());
                }
            }
            Op::Detach(s) => {
                if let Some(b) = pick(s) {
                    let was_disposed = b.is_disposed();
                    match b.detach() {
                        Ok(l) => assert_eq!(Some(l), b.listener()),
                        Err(SignalError::UseAfterDispose) => assert!(was_disposed),
                        Err(_) => assert!(!b.is_bound()),
                    }
                }
            }
            Op::Dispose(s) => {
                if let Some(b) = pick(s) {
                    let was_disposed = b.is_disposed();
                    assert_eq!(b.dispose().is_err(), was_disposed);
                    assert!(b.is_disposed());
                }
            }
            Op::Execute(s) => {
                if let Some(b) = pick(s) {
                    if b.is_disposed() {
                        assert_eq!(b.execute(0), Err(SignalError::UseAfterDispose));
                    } else {
                        let _ = b.execute(0);
                    }
                }
            }
            Op::Dispatch => signal.dispatch(0).expect("signal is never disposed here"),
            Op::SetActive(active) => signal.set_active(active),
            Op::RemoveAll => signal.remove_all().expect("signal is never disposed here"),
        }

        let bound = bindings
            .borrow()
            .iter()
            .flatten()
            .filter(|b| b.is_bound())
            .count();
        assert!(bound <= signal.listener_count());
    }

    // Listeners hold the signal and the slot tables; break the cycles.
    let _ = signal.dispose();
    bindings.borrow_mut().clear();
    listeners.borrow_mut().clear();
});
