use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{join, join3, join4, BoxFuture, FutureExt};

use crate::error::Result;
use crate::prop::Prop;

/// Result of one branch, plus the cooperative break marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow<T> {
    /// Produce the value and carry on.
    Continue(T),
    /// Produce the value, then ask later branches to stand down.
    Break(T),
}

impl<T> Flow<T> {
    /// True when this result carries the break marker.
    pub fn is_break(&self) -> bool {
        matches!(self, Flow::Break(_))
    }

    /// Unwraps the produced value.
    pub fn into_inner(self) -> T {
        match self {
            Flow::Continue(value) | Flow::Break(value) => value,
        }
    }
}

/// Break flag shared by every branch of one composite invocation.
///
/// The first `set` wins; later calls are no-ops.  Branches consult the
/// flag before binding their outputs, so work dispatched before the
/// break still runs but no longer publishes results.
#[derive(Clone, Default)]
pub struct Signal(Arc<AtomicBool>);

impl Signal {
    /// Creates an unraised signal.
    pub fn new() -> Self {
        Signal::default()
    }

    /// Raises the signal.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once any branch has raised the signal.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One named input to a branch: either a literal value or a deferred
/// [`Prop`] assigned by some other branch.
pub enum Source<T> {
    /// A literal, immediately available value.
    Value(T),
    /// A deferred value; resolution suspends until it is assigned.
    Prop(Prop<T>),
}

impl<T: Clone + Send + 'static> Source<T> {
    /// Wraps a literal value.
    pub fn value(value: T) -> Self {
        Source::Value(value)
    }

    /// References a prop; the branch sees its eventual value.
    ///
    /// To hand a branch the prop itself rather than what it resolves
    /// to, pass it as a literal: `Source::value(prop.clone())`.
    pub fn prop(prop: &Prop<T>) -> Self {
        Source::Prop(prop.clone())
    }

    /// Resolves to the concrete input, suspending on an unset prop.
    pub async fn resolve(self) -> T {
        match self {
            Source::Value(value) => value,
            Source::Prop(prop) => prop.wait().await,
        }
    }
}

impl<T: Clone + Send + 'static> From<Prop<T>> for Source<T> {
    fn from(prop: Prop<T>) -> Self {
        Source::Prop(prop)
    }
}

/// A branch's full input binding.
///
/// Implementations resolve every named source concurrently before the
/// branch function runs; a branch therefore starts only once all of
/// its deferred inputs have been assigned.
pub trait Input: Send + 'static {
    /// Concrete input handed to the branch function.
    type Resolved: Send + 'static;

    /// Resolves the binding, suspending until deferred inputs settle.
    fn resolve(self) -> BoxFuture<'static, Self::Resolved>;
}

impl Input for () {
    type Resolved = ();

    fn resolve(self) -> BoxFuture<'static, ()> {
        futures::future::ready(()).boxed()
    }
}

impl<T: Clone + Send + 'static> Input for Source<T> {
    type Resolved = T;

    fn resolve(self) -> BoxFuture<'static, T> {
        Source::resolve(self).boxed()
    }
}

impl<A: Input, B: Input> Input for (A, B) {
    type Resolved = (A::Resolved, B::Resolved);

    fn resolve(self) -> BoxFuture<'static, Self::Resolved> {
        join(self.0.resolve(), self.1.resolve()).boxed()
    }
}

impl<A: Input, B: Input, C: Input> Input for (A, B, C) {
    type Resolved = (A::Resolved, B::Resolved, C::Resolved);

    fn resolve(self) -> BoxFuture<'static, Self::Resolved> {
        join3(self.0.resolve(), self.1.resolve(), self.2.resolve()).boxed()
    }
}

impl<A: Input, B: Input, C: Input, D: Input> Input for (A, B, C, D) {
    type Resolved = (A::Resolved, B::Resolved, C::Resolved, D::Resolved);

    fn resolve(self) -> BoxFuture<'static, Self::Resolved> {
        join4(
            self.0.resolve(),
            self.1.resolve(),
            self.2.resolve(),
            self.3.resolve(),
        )
        .boxed()
    }
}

/// A branch's output binding: where produced values land.
///
/// Bindings are built fresh per invocation and consumed by the single
/// `bind` call once the branch settles.
pub trait Output<T>: Send + 'static {
    /// Assigns the produced value into the bound props.
    fn bind(self, value: T) -> Result<()>;
}

impl Output<()> for () {
    fn bind(self, _value: ()) -> Result<()> {
        Ok(())
    }
}

impl<T: Clone + Send + 'static> Output<T> for Prop<T> {
    fn bind(self, value: T) -> Result<()> {
        self.set(value)
    }
}

/// An absent result field leaves the bound prop untouched.
impl<T: Clone + Send + 'static> Output<Option<T>> for Prop<T> {
    fn bind(self, value: Option<T>) -> Result<()> {
        match value {
            Some(value) => self.set(value),
            None => Ok(()),
        }
    }
}

impl<A, B, OA: Output<A>, OB: Output<B>> Output<(A, B)> for (OA, OB) {
    fn bind(self, value: (A, B)) -> Result<()> {
        self.0.bind(value.0)?;
        self.1.bind(value.1)
    }
}

impl<A, B, C, OA: Output<A>, OB: Output<B>, OC: Output<C>> Output<(A, B, C)> for (OA, OB, OC) {
    fn bind(self, value: (A, B, C)) -> Result<()> {
        self.0.bind(value.0)?;
        self.1.bind(value.1)?;
        self.2.bind(value.2)
    }
}

impl<A, B, C, D, OA, OB, OC, OD> Output<(A, B, C, D)> for (OA, OB, OC, OD)
where
    OA: Output<A>,
    OB: Output<B>,
    OC: Output<C>,
    OD: Output<D>,
{
    fn bind(self, value: (A, B, C, D)) -> Result<()> {
        self.0.bind(value.0)?;
        self.1.bind(value.1)?;
        self.2.bind(value.2)?;
        self.3.bind(value.3)
    }
}

#[cfg(test)]
mod branch_test {
    use super::*;

    #[test]
    fn test_signal_first_write_wins() {
        let signal = Signal::new();
        assert!(!signal.is_set());
        signal.set();
        signal.set();
        assert!(signal.is_set());
    }

    #[tokio::test]
    async fn test_source_resolution() {
        assert_eq!(Source::value(4).resolve().await, 4);

        let p = Prop::new();
        let source = Source::prop(&p);
        let (value, _) = tokio::join!(source.resolve(), async { p.set(8).unwrap() });
        assert_eq!(value, 8);
    }

    #[tokio::test]
    async fn test_tuple_inputs_resolve_together() {
        let p = Prop::new();
        let binding = (Source::value(1), Source::prop(&p));
        let ((a, b), _) = tokio::join!(binding.resolve(), async { p.set(2).unwrap() });
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn test_output_bindings() {
        let p = Prop::new();
        p.clone().bind(5).unwrap();
        assert_eq!(p.get(), Some(5));

        // Absent fields skip assignment entirely.
        let q: Prop<usize> = Prop::new();
        q.clone().bind(None).unwrap();
        assert_eq!(q.get(), None);

        let (a, b) = (Prop::new(), Prop::new());
        (a.clone(), b.clone()).bind(("x", "y")).unwrap();
        assert_eq!((a.get(), b.get()), (Some("x"), Some("y")));
    }

    #[test]
    fn test_flow_accessors() {
        assert!(Flow::Break(1).is_break());
        assert!(!Flow::Continue(1).is_break());
        assert_eq!(Flow::Break(2).into_inner(), 2);
    }
}
