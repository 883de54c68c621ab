//! Input event payloads and observer-list dispatch.
//!
//! Cross-component notification uses explicit observer lists
//! ([`Handlers`]) with typed event payloads. Dispatch snapshots the
//! handler list first, so a handler may connect or disconnect observers
//! (including itself) without disturbing the iteration in flight.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::geometry::{Point, Vec2};

// ─────────────────────────────────────────────────────────────────────────────
// Input Events
// ─────────────────────────────────────────────────────────────────────────────

/// Pointer button identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// A positioned input event delivered by the platform backend.
///
/// The core only resolves the target via hit testing; capture/bubble
/// routing is the embedder's concern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown {
        position: Point,
        button: PointerButton,
    },
    PointerUp {
        position: Point,
        button: PointerButton,
    },
    PointerMove {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

impl InputEvent {
    /// Stage-space position of the event
    pub fn position(&self) -> Point {
        match self {
            InputEvent::PointerDown { position, .. }
            | InputEvent::PointerUp { position, .. }
            | InputEvent::PointerMove { position }
            | InputEvent::Scroll { position, .. } => *position,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Observer Lists
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier for a connected handler, used to disconnect it later
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct HandlerEntry<E> {
    id: HandlerId,
    callback: Callback<E>,
}

/// An observer list with typed event payloads.
///
/// `emit` clones the current handler set before invoking anything, so
/// handlers connected during dispatch only see later emissions, and a
/// handler disconnected during dispatch may still receive the event it was
/// snapshotted for; observers must re-check their own validity if that
/// matters to them.
pub struct Handlers<E> {
    entries: RefCell<Vec<HandlerEntry<E>>>,
    next_id: Cell<u64>,
}

impl<E> Handlers<E> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register a handler; returns an id for later disconnection
    pub fn connect(&self, callback: impl FnMut(&E) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.entries.borrow_mut().push(HandlerEntry {
            id,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    /// Remove a handler. Returns false if the id was already disconnected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Invoke every currently-connected handler with `event`
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self
            .entries
            .borrow()
            .iter()
            .map(|entry| entry.callback.clone())
            .collect();
        for callback in snapshot {
            (callback.borrow_mut())(event);
        }
    }
}

impl<E> Default for Handlers<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_connect_emit_disconnect() {
        let handlers: Handlers<i32> = Handlers::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen2 = seen.clone();
        let id = handlers.connect(move |v| seen2.borrow_mut().push(*v));

        handlers.emit(&1);
        handlers.emit(&2);
        assert!(handlers.disconnect(id));
        handlers.emit(&3);

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert!(!handlers.disconnect(id));
    }

    #[test]
    fn test_connect_during_emit_sees_later_events_only() {
        let handlers: Rc<Handlers<i32>> = Rc::new(Handlers::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let h2 = handlers.clone();
        let seen2 = seen.clone();
        handlers.connect(move |v| {
            if *v == 1 {
                let seen3 = seen2.clone();
                h2.connect(move |v| seen3.borrow_mut().push(*v * 10));
            }
        });

        handlers.emit(&1);
        handlers.emit(&2);

        // The nested handler was not part of the first emission's snapshot.
        assert_eq!(*seen.borrow(), vec![20]);
    }

    #[test]
    fn test_disconnect_during_emit_does_not_disturb_iteration() {
        let handlers: Rc<Handlers<i32>> = Rc::new(Handlers::new());
        let count = Rc::new(Cell::new(0));

        let h2 = handlers.clone();
        let id_cell: Rc<Cell<Option<HandlerId>>> = Rc::new(Cell::new(None));
        let id_cell2 = id_cell.clone();
        handlers.connect(move |_| {
            if let Some(id) = id_cell2.take() {
                h2.disconnect(id);
            }
        });
        let count2 = count.clone();
        let id = handlers.connect(move |_| count2.set(count2.get() + 1));
        id_cell.set(Some(id));

        // First emit: the second handler is snapshotted before the first
        // handler disconnects it, so it still runs once.
        handlers.emit(&0);
        handlers.emit(&0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_input_event_position() {
        let ev = InputEvent::PointerDown {
            position: Point::new(3.0, 4.0),
            button: PointerButton::Primary,
        };
        assert_eq!(ev.position(), Point::new(3.0, 4.0));
    }
}
