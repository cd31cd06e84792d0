use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::error::{Error, Result};

enum State<T> {
    Unset(Vec<Waker>),
    Set(T),
}

/// A single-assignment deferred value.
///
/// A `Prop` starts unset, is assigned at most once with [`Prop::set`],
/// and can be read synchronously with [`Prop::get`] or awaited with
/// [`Prop::wait`].  Clones share the same cell, so a `Prop` acts as a
/// single-writer, multi-reader channel between branches of a
/// computation.
///
/// ```rust
/// use flowctl::prop::Prop;
///
/// let p = Prop::new();
/// assert_eq!(p.get(), None);
/// p.set(3usize).unwrap();
/// assert_eq!(p.get(), Some(3));
/// assert!(p.set(4).is_err());
/// ```
pub struct Prop<T> {
    cell: Arc<Mutex<State<T>>>,
}

impl<T> Clone for Prop<T> {
    fn clone(&self) -> Self {
        Prop { cell: self.cell.clone() }
    }
}

impl<T: Clone> Prop<T> {
    /// Creates an unset prop.
    pub fn new() -> Self {
        Prop { cell: Arc::new(Mutex::new(State::Unset(Vec::new()))) }
    }

    /// Lifts a concrete value into an already-assigned, immutable prop.
    pub fn lift(value: T) -> Self {
        Prop { cell: Arc::new(Mutex::new(State::Set(value))) }
    }

    /// Reads the current value without suspending.  `None` means the
    /// prop has not been assigned yet.
    pub fn get(&self) -> Option<T> {
        match *self.cell.lock().unwrap() {
            State::Set(ref value) => Some(value.clone()),
            State::Unset(_) => None,
        }
    }

    /// True once a value has been assigned.
    pub fn is_set(&self) -> bool {
        matches!(*self.cell.lock().unwrap(), State::Set(_))
    }

    /// Assigns the value, waking every waiter.  A prop can be assigned
    /// exactly once; the first value is retained on a failed attempt.
    pub fn set(&self, value: T) -> Result<()> {
        let mut cell = self.cell.lock().unwrap();
        if let State::Set(_) = *cell {
            return Err(Error::InvalidState);
        }
        let old = std::mem::replace(&mut *cell, State::Set(value));
        drop(cell);
        if let State::Unset(wakers) = old {
            for waker in wakers {
                waker.wake();
            }
        }
        Ok(())
    }

    /// Returns a future resolving to the assigned value.  Resolves
    /// immediately when the prop is already set; an unassigned prop
    /// suspends its waiters until [`Prop::set`] runs, possibly forever.
    pub fn wait(&self) -> PropFuture<T> {
        PropFuture { prop: self.clone() }
    }
}

impl<T: Clone> Default for Prop<T> {
    fn default() -> Self {
        Prop::new()
    }
}

impl<T: Clone> From<T> for Prop<T> {
    fn from(value: T) -> Self {
        Prop::lift(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.cell.lock().unwrap() {
            State::Set(ref value) => write!(f, "Prop({:?})", value),
            State::Unset(_) => write!(f, "Prop(<unset>)"),
        }
    }
}

/// Future returned by [`Prop::wait`].
pub struct PropFuture<T> {
    prop: Prop<T>,
}

impl<T: Clone> Future for PropFuture<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut cell = self.prop.cell.lock().unwrap();
        match *cell {
            State::Set(ref value) => Poll::Ready(value.clone()),
            State::Unset(ref mut wakers) => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}
