use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use log::debug;

use flowctl::error::{Error, Result};
use flowctl::limit::Limit;

use crate::iterable::{iterate, Iterable, Key};
use crate::pipe::{pipe, PipeReceiver, PipeSender};

/// Tuning knobs for one aggregation pass.
#[derive(Clone, Default)]
pub struct Options {
    compress: bool,
    concurrency: Option<usize>,
}

impl Options {
    /// Default options: no throttling, an absent result is an error.
    pub fn new() -> Options {
        Options::default()
    }

    /// Drops absent results from the output instead of failing on
    /// them; they never satisfy `to_value` either.
    pub fn compress(mut self) -> Options {
        self.compress = true;
        self
    }

    /// Routes every element callback through a limiter with `n` slots.
    /// The cap bounds in-flight work without reordering dispatch.
    pub fn concurrency(mut self, n: usize) -> Options {
        self.concurrency = Some(n);
        self
    }
}

/// Drives a traversal to completion, discarding per-element results.
///
/// This is the execution primitive beneath the `to_*` collectors: it
/// applies the optional concurrency cap and otherwise inherits the
/// traversal policy of [`iterate`] for the iterable's shape.
pub async fn all<T, I, F, Fut>(iterable: I, options: Options, f: F) -> Result<()>
where
    I: Into<Iterable<T>>,
    F: Fn(T, Option<Key>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let limit = match options.concurrency {
        Some(n) => {
            debug!("Throttling traversal to {} in flight", n);
            Some(Limit::new(n)?)
        }
        None => None,
    };
    let limit = &limit;
    let f = &f;
    iterate(iterable.into(), move |value, key| async move {
        match limit {
            Some(limit) => limit.run(f(value, key)).await,
            None => f(value, key).await,
        }
    })
    .await
}

/// Invokes zero-argument tasks strictly one after another, collecting
/// their results in input order.  Implemented as [`all`] capped to one
/// slot, so each task fully settles before the next starts.
pub async fn each<V, F, Fut>(tasks: Vec<F>) -> Result<Vec<V>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
{
    let out = Mutex::new(Vec::with_capacity(tasks.len()));
    let out_ref = &out;
    all(tasks, Options::new().concurrency(1), move |task, _key| async move {
        let value = task().await?;
        out_ref.lock().unwrap().push(value);
        Ok(())
    })
    .await?;
    Ok(out.into_inner().unwrap())
}

/// The shared collection engine: traverse through [`all`], transform,
/// hand present results to the sink.  On any failure the partial
/// output never reaches the caller.
async fn collect<T, V, I, F, Fut, S>(iterable: I, options: Options, f: F, sink: S) -> Result<()>
where
    I: Into<Iterable<T>>,
    F: Fn(T, Option<Key>) -> Fut,
    Fut: Future<Output = Result<Option<V>>>,
    S: Fn(V) -> Result<()>,
{
    let compress = options.compress;
    let f = &f;
    let sink = &sink;
    all(iterable, options, move |value, key| async move {
        match f(value, key).await? {
            Some(value) => sink(value),
            None if compress => Ok(()),
            None => Err(Error::UndefinedValue("map")),
        }
    })
    .await
}

/// Collects transformed elements into an array.
///
/// Fanned-out shapes push in completion order; stream sources push in
/// input order.
///
/// ```rust
/// use flowctl_collection::map::{to_array, Options};
///
/// let out = futures::executor::block_on(to_array(
///     vec![1, 2, 3],
///     Options::new(),
///     |v, _| async move { Ok(Some(v)) },
/// ))
/// .unwrap();
/// assert_eq!(out, vec![1, 2, 3]);
/// ```
pub async fn to_array<T, V, I, F, Fut>(iterable: I, options: Options, f: F) -> Result<Vec<V>>
where
    I: Into<Iterable<T>>,
    F: Fn(T, Option<Key>) -> Fut,
    Fut: Future<Output = Result<Option<V>>>,
{
    let out = Mutex::new(Vec::new());
    collect(iterable, options, f, |value| {
        out.lock().unwrap().push(value);
        Ok(())
    })
    .await?;
    Ok(out.into_inner().unwrap())
}

/// Collects `(key, value)` pairs into a record; on a key collision the
/// last write wins.
///
/// ```rust
/// use flowctl_collection::iterable::Key;
/// use flowctl_collection::map::{to_record, Options};
///
/// let out = futures::executor::block_on(to_record(
///     vec!["a", "b"],
///     Options::new(),
///     |v, k| async move { Ok(Some((k.unwrap(), v))) },
/// ))
/// .unwrap();
/// assert_eq!(out.get(&Key::Index(1)), Some(&"b"));
/// ```
pub async fn to_record<T, V, I, F, Fut>(
    iterable: I,
    options: Options,
    f: F,
) -> Result<HashMap<Key, V>>
where
    I: Into<Iterable<T>>,
    F: Fn(T, Option<Key>) -> Fut,
    Fut: Future<Output = Result<Option<(Key, V)>>>,
{
    let out = Mutex::new(HashMap::new());
    collect(iterable, options, f, |(key, value)| {
        out.lock().unwrap().insert(key, value);
        Ok(())
    })
    .await?;
    Ok(out.into_inner().unwrap())
}

/// Collects transformed elements onto a fresh stream, closed once the
/// traversal completes.
pub async fn to_stream<T, V, I, F, Fut>(
    iterable: I,
    options: Options,
    f: F,
) -> Result<PipeReceiver<V>>
where
    I: Into<Iterable<T>>,
    F: Fn(T, Option<Key>) -> Fut,
    Fut: Future<Output = Result<Option<V>>>,
{
    let (tx, rx) = pipe();
    to_stream_into(&tx, iterable, options, f).await?;
    tx.close();
    Ok(rx)
}

/// Feeds transformed elements into an existing pipe and leaves it
/// open; the sender's owner decides when the stream ends.
pub async fn to_stream_into<T, V, I, F, Fut>(
    sender: &PipeSender<V>,
    iterable: I,
    options: Options,
    f: F,
) -> Result<()>
where
    I: Into<Iterable<T>>,
    F: Fn(T, Option<Key>) -> Fut,
    Fut: Future<Output = Result<Option<V>>>,
{
    collect(iterable, options, f, |value| sender.send(value)).await
}

/// Keeps the first present result and ignores the rest.
pub async fn to_value<T, V, I, F, Fut>(iterable: I, options: Options, f: F) -> Result<Option<V>>
where
    I: Into<Iterable<T>>,
    F: Fn(T, Option<Key>) -> Fut,
    Fut: Future<Output = Result<Option<V>>>,
{
    let out = Mutex::new(None);
    collect(iterable, options, f, |value| {
        let mut slot = out.lock().unwrap();
        if slot.is_none() {
            *slot = Some(value);
        }
        Ok(())
    })
    .await?;
    Ok(out.into_inner().unwrap())
}
