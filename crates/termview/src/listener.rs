//! A minimal observable: a list of callbacks fired in registration order.

use std::fmt;

/// Token returned by [`Listeners::add`], used to remove the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A boxed callback receiving the event source and the event arguments.
type Callback<S, A> = Box<dyn Fn(&S, &A)>;

/// A pub/sub channel for events of shape `A` raised by a source of type `S`.
///
/// The source is handed to [`fire`](Self::fire) rather than stored, so a
/// registry never keeps its owner alive.
pub struct Listeners<S: ?Sized, A: ?Sized> {
    /// Registered callbacks, in registration order.
    callbacks: Vec<(ListenerId, Callback<S, A>)>,
    /// Next token to hand out.
    next_id: u64,
}

impl<S: ?Sized, A: ?Sized> Listeners<S, A> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            next_id: 0,
        }
    }

    /// Append a callback.
    pub fn add(&mut self, f: impl Fn(&S, &A) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(f)));
        id
    }

    /// Remove a registration. Returns false if it was not present.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        if let Some(pos) = self.callbacks.iter().position(|(i, _)| *i == id) {
            drop(self.callbacks.remove(pos));
            true
        } else {
            false
        }
    }

    /// Invoke every callback with `(source, args)`.
    pub fn fire(&self, source: &S, args: &A) {
        for (_, f) in &self.callbacks {
            f(source, args);
        }
    }

    /// The number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Are there no callbacks?
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<S: ?Sized, A: ?Sized> Default for Listeners<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized, A: ?Sized> fmt::Debug for Listeners<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.callbacks.len())
            .finish()
    }
}
