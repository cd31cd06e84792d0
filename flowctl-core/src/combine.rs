use std::future::Future;

use futures::future::{join_all, BoxFuture, FutureExt};
use log::debug;

use crate::branch::{Flow, Input, Output, Signal};
use crate::error::{Error, Result};

type BranchFuture = BoxFuture<'static, Result<()>>;
type BranchFn = Box<dyn FnOnce(Signal) -> BranchFuture + Send>;

struct Named {
    name: String,
    run: BranchFn,
}

/// Packages one branch into a deferred run: resolve the input binding,
/// invoke the function, observe the break signal, bind the outputs.
fn bound<I, F, Fut, T, O>(name: &str, input: I, f: F, output: O) -> Named
where
    I: Input,
    F: FnOnce(I::Resolved) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Flow<T>>> + Send + 'static,
    T: Send + 'static,
    O: Output<T>,
{
    let name = name.to_string();
    let label = name.clone();
    let run: BranchFn = Box::new(move |signal: Signal| {
        async move {
            let resolved = input.resolve().await;
            debug!("Branch {} running", label);
            let flow = f(resolved).await?;
            // Late finishers observe the flag before binding.
            let stand_down = signal.is_set();
            if flow.is_break() {
                debug!("Branch {} raised the break signal", label);
                signal.set();
            }
            if stand_down {
                debug!("Branch {} settled after the break, outputs skipped", label);
                return Ok(());
            }
            output.bind(flow.into_inner())
        }
        .boxed()
    });
    Named { name, run }
}

fn finish(signal: &Signal) -> Flow<()> {
    if signal.is_set() {
        Flow::Break(())
    } else {
        Flow::Continue(())
    }
}

/// Composes named branches that run concurrently.
///
/// Every branch's input resolution and execution is dispatched without
/// awaiting the others; the invocation completes when all dispatched
/// branches are done.  Output props double as input channels, so
/// branches may feed each other regardless of declaration order.
///
/// ```rust
/// use flowctl::branch::{Flow, Source};
/// use flowctl::combine::All;
/// use flowctl::prop::Prop;
///
/// let total = Prop::new();
/// let combo = All::new().branch(
///     "add",
///     (Source::value(1), Source::value(2)),
///     |(a, b): (i32, i32)| async move { Ok(Flow::Continue(a + b)) },
///     total.clone(),
/// );
/// futures::executor::block_on(combo.run()).unwrap();
/// assert_eq!(total.get(), Some(3));
/// ```
pub struct All {
    branches: Vec<Named>,
}

impl All {
    /// Creates an empty composite.
    pub fn new() -> Self {
        All { branches: Vec::new() }
    }

    /// Adds a named branch with its input and output bindings.
    pub fn branch<I, F, Fut, T, O>(mut self, name: &str, input: I, f: F, output: O) -> Self
    where
        I: Input,
        F: FnOnce(I::Resolved) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Flow<T>>> + Send + 'static,
        T: Send + 'static,
        O: Output<T>,
    {
        self.branches.push(bound(name, input, f, output));
        self
    }

    /// Dispatches every branch, waits for all of them, and reports
    /// whether any raised the break signal.  Branch failures never
    /// cancel siblings; every failure is gathered into the result.
    pub async fn run(self) -> Result<Flow<()>> {
        let signal = Signal::new();
        debug!("Dispatching {} branches", self.branches.len());
        let runs: Vec<_> = self
            .branches
            .into_iter()
            .map(|branch| (branch.run)(signal.clone()))
            .collect();
        let errs: Vec<Error> = join_all(runs)
            .await
            .into_iter()
            .filter_map(|outcome| outcome.err())
            .collect();
        Error::gather(errs)?;
        Ok(finish(&signal))
    }
}

impl Default for All {
    fn default() -> Self {
        All::new()
    }
}

/// Composes named branches that run strictly one after another.
///
/// Each branch fully settles, outputs bound, before the next starts.
/// Once a branch result raises the break signal, every remaining
/// branch is skipped and its outputs are never assigned.
pub struct Each {
    branches: Vec<Named>,
}

impl Each {
    /// Creates an empty composite.
    pub fn new() -> Self {
        Each { branches: Vec::new() }
    }

    /// Adds a named branch; insertion order is execution order.
    pub fn branch<I, F, Fut, T, O>(mut self, name: &str, input: I, f: F, output: O) -> Self
    where
        I: Input,
        F: FnOnce(I::Resolved) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Flow<T>>> + Send + 'static,
        T: Send + 'static,
        O: Output<T>,
    {
        self.branches.push(bound(name, input, f, output));
        self
    }

    /// Drives branches in insertion order; the first failure stops the
    /// sequence.
    pub async fn run(self) -> Result<Flow<()>> {
        let signal = Signal::new();
        for branch in self.branches {
            if signal.is_set() {
                debug!("Branch {} skipped", branch.name);
                continue;
            }
            (branch.run)(signal.clone()).await?;
        }
        Ok(finish(&signal))
    }
}

impl Default for Each {
    fn default() -> Self {
        Each::new()
    }
}

/// [`All`] restricted to branches whose binding is present.
///
/// A branch handed `None` is excluded from the call outright: its
/// function is never invoked and no outputs exist for it.
pub struct Any {
    inner: All,
}

impl Any {
    /// Creates an empty composite.
    pub fn new() -> Self {
        Any { inner: All::new() }
    }

    /// Adds a named branch when its binding is present.
    pub fn branch<I, F, Fut, T, O>(mut self, name: &str, f: F, binding: Option<(I, O)>) -> Self
    where
        I: Input,
        F: FnOnce(I::Resolved) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Flow<T>>> + Send + 'static,
        T: Send + 'static,
        O: Output<T>,
    {
        match binding {
            Some((input, output)) => {
                self.inner = self.inner.branch(name, input, f, output);
            }
            None => debug!("Branch {} has no binding, excluded", name),
        }
        self
    }

    /// Runs the present branches concurrently, as [`All::run`] does.
    pub async fn run(self) -> Result<Flow<()>> {
        self.inner.run().await
    }
}

impl Default for Any {
    fn default() -> Self {
        Any::new()
    }
}

#[cfg(test)]
mod combine_test {
    use super::*;
    use crate::branch::Source;
    use crate::prop::Prop;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_all_binds_outputs() {
        let out_a = Prop::new();
        let out_b = Prop::new();
        let flow = All::new()
            .branch(
                "a",
                Source::value(1),
                |x: i32| async move { Ok(Flow::Continue(x)) },
                out_a.clone(),
            )
            .branch(
                "b",
                Source::value(2),
                |y: i32| async move { Ok(Flow::Continue(y)) },
                out_b.clone(),
            )
            .run()
            .await
            .unwrap();
        assert!(!flow.is_break());
        assert_eq!(out_a.get(), Some(1));
        assert_eq!(out_b.get(), Some(2));
    }

    #[tokio::test]
    async fn test_all_feeds_props_across_branches() {
        let chan = Prop::new();
        let out = Prop::new();
        let feeder = chan.clone();
        // "consume" is declared first but suspends on its input until
        // "produce" assigns the channel prop.
        let flow = All::new()
            .branch(
                "consume",
                Source::prop(&chan),
                |v: i32| async move { Ok(Flow::Continue(v * 2)) },
                out.clone(),
            )
            .branch(
                "produce",
                (),
                move |_| async move {
                    feeder.set(21)?;
                    Ok(Flow::Continue(()))
                },
                (),
            )
            .run()
            .await
            .unwrap();
        assert!(!flow.is_break());
        assert_eq!(out.get(), Some(42));
    }

    #[tokio::test]
    async fn test_each_runs_in_order() {
        let started = Arc::new(AtomicUsize::new(0));
        let link = Prop::new();
        let out = Prop::new();
        let s1 = started.clone();
        let s2 = started.clone();
        let flow = Each::new()
            .branch(
                "first",
                (),
                move |_| async move {
                    s1.fetch_add(1, Ordering::SeqCst);
                    Ok(Flow::Continue(10))
                },
                link.clone(),
            )
            .branch(
                "second",
                Source::prop(&link),
                move |v: i32| async move {
                    // Exactly one branch has started before this body runs.
                    assert_eq!(s2.load(Ordering::SeqCst), 1);
                    Ok(Flow::Continue(v + 1))
                },
                out.clone(),
            )
            .run()
            .await
            .unwrap();
        assert!(!flow.is_break());
        assert_eq!(link.get(), Some(10));
        assert_eq!(out.get(), Some(11));
    }

    #[tokio::test]
    async fn test_each_break_short_circuit() {
        let a = Prop::new();
        let b = Prop::new();
        let c = Prop::new();
        let flow = Each::new()
            .branch("first", (), |_| async move { Ok(Flow::Continue(1)) }, a.clone())
            .branch("second", (), |_| async move { Ok(Flow::Break(2)) }, b.clone())
            .branch("third", (), |_| async move { Ok(Flow::Continue(3)) }, c.clone())
            .run()
            .await
            .unwrap();
        assert!(flow.is_break());
        assert_eq!(a.get(), Some(1));
        assert_eq!(b.get(), Some(2));
        assert_eq!(c.get(), None);
    }

    #[tokio::test]
    async fn test_any_excludes_absent_branches() {
        let called = Arc::new(AtomicUsize::new(0));
        let out = Prop::new();
        let spy = called.clone();
        let flow = Any::new()
            .branch(
                "a",
                |x: i32| async move { Ok(Flow::Continue(x)) },
                Some((Source::value(5), out.clone())),
            )
            .branch(
                "b",
                move |x: i32| async move {
                    spy.fetch_add(1, Ordering::SeqCst);
                    Ok(Flow::Continue(x))
                },
                None::<(Source<i32>, Prop<i32>)>,
            )
            .run()
            .await
            .unwrap();
        assert!(!flow.is_break());
        assert_eq!(out.get(), Some(5));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_gathers_failures() {
        let err = All::new()
            .branch(
                "bad",
                (),
                |_| async { Err::<Flow<()>, _>(Error::UndefinedValue("bad")) },
                (),
            )
            .branch(
                "worse",
                (),
                |_| async { Err::<Flow<()>, _>(Error::StreamClosed) },
                (),
            )
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Failures(ref errs) if errs.len() == 2));
    }

    #[tokio::test]
    async fn test_each_stops_at_first_failure() {
        let reached = Prop::new();
        let err = Each::new()
            .branch(
                "bad",
                (),
                |_| async { Err::<Flow<()>, _>(Error::UndefinedValue("bad")) },
                (),
            )
            .branch(
                "after",
                (),
                |_| async move { Ok(Flow::Continue(true)) },
                reached.clone(),
            )
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UndefinedValue(_)));
        assert_eq!(reached.get(), None);
    }
}
