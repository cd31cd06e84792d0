use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use futures::future::join_all;
use log::trace;

use flowctl::error::{Error, Result};

use crate::pipe::PipeReceiver;

/// Positional or key metadata handed to visitors alongside each value.
/// Stream elements carry no key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Position within an ordered sequence.
    Index(usize),
    /// Key within a keyed mapping.
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(idx) => write!(f, "{}", idx),
            Key::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<usize> for Key {
    fn from(idx: usize) -> Key {
        Key::Index(idx)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Key {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Key {
        Key::Name(name)
    }
}

/// A traversable input in exactly one of three shapes, resolved once
/// at the [`iterate`] entry point.
pub enum Iterable<T> {
    /// Finite ordered sequence; visited with `Key::Index`, fanned out.
    List(Vec<T>),
    /// Keyed mapping; visited with `Key::Name`, fanned out.  Iteration
    /// order is the map's own.
    Mapping(HashMap<String, T>),
    /// Push stream; visited without a key, strictly one at a time.
    Stream(PipeReceiver<T>),
}

impl<T> From<Vec<T>> for Iterable<T> {
    fn from(items: Vec<T>) -> Self {
        Iterable::List(items)
    }
}

impl<T> From<HashMap<String, T>> for Iterable<T> {
    fn from(entries: HashMap<String, T>) -> Self {
        Iterable::Mapping(entries)
    }
}

impl<T> From<PipeReceiver<T>> for Iterable<T> {
    fn from(stream: PipeReceiver<T>) -> Self {
        Iterable::Stream(stream)
    }
}

/// Drives one traversal of `iterable`, invoking `visit` per element.
///
/// Lists and mappings have a known extent, so every visit is
/// dispatched before any is awaited and the traversal completes when
/// all of them settle; their failures are gathered, not raced.  A
/// stream permits one outstanding pull, so each visit is awaited
/// before the next value is pulled and the first failure stops the
/// pump.  Empty inputs complete immediately.
pub async fn iterate<T, F, Fut>(iterable: Iterable<T>, visit: F) -> Result<()>
where
    F: Fn(T, Option<Key>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match iterable {
        Iterable::List(items) => {
            trace!("Iterating a list of {}", items.len());
            let visits: Vec<_> = items
                .into_iter()
                .enumerate()
                .map(|(idx, value)| visit(value, Some(Key::Index(idx))))
                .collect();
            gather(join_all(visits).await)
        }
        Iterable::Mapping(entries) => {
            trace!("Iterating a mapping of {}", entries.len());
            let visits: Vec<_> = entries
                .into_iter()
                .map(|(key, value)| visit(value, Some(Key::Name(key))))
                .collect();
            gather(join_all(visits).await)
        }
        Iterable::Stream(mut stream) => {
            trace!("Iterating a stream");
            while let Some(value) = stream.next().await {
                visit(value, None).await?;
            }
            Ok(())
        }
    }
}

fn gather(outcomes: Vec<Result<()>>) -> Result<()> {
    Error::gather(outcomes.into_iter().filter_map(|r| r.err()).collect())
}
