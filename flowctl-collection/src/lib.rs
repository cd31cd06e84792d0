//! Flowctl-Collection
//! ---
//! Flowctl-Collection unifies iteration and aggregation over heterogeneous sequence shapes.
//!
//! What is it?
//! ---
//! Flowctl-Collection provides one traversal protocol over three kinds of input — ordered
//! lists, keyed mappings, and push streams — plus an aggregation engine that maps each
//! element through an async callback and collects the results into an array, record,
//! stream, or single value.  Traversal fans out where the input's extent is known and
//! pumps strictly in order where it is not, and the whole pass can be throttled through
//! the `flowctl` concurrency limiter.
//!
//! Example - Reshaping a list
//! ---
//!
//! ```rust
//! use flowctl_collection::iterable::Key;
//! use flowctl_collection::map::{to_record, Options};
//!
//! let record = futures::executor::block_on(to_record(
//!     vec!["a", "b"],
//!     Options::new(),
//!     |value, key| async move { Ok(Some((key.unwrap(), value))) },
//! ))
//! .unwrap();
//!
//! assert_eq!(record.get(&Key::Index(0)), Some(&"a"));
//! assert_eq!(record.get(&Key::Index(1)), Some(&"b"));
//! ```
//!
//! Example - Draining a stream
//! ---
//!
//! ```rust
//! use flowctl_collection::map::{to_array, Options};
//! use flowctl_collection::pipe::pipe;
//!
//! let (tx, rx) = pipe();
//! for chunk in vec!["x", "y"] {
//!     tx.send(chunk).unwrap();
//! }
//! tx.close();
//!
//! let out = futures::executor::block_on(to_array(
//!     rx,
//!     Options::new(),
//!     |chunk, _| async move { Ok(Some(chunk)) },
//! ))
//! .unwrap();
//! assert_eq!(out, vec!["x", "y"]);
//! ```

#![warn(missing_docs)]

/// Defines the three iterable shapes and the traversal protocol
pub mod iterable;

/// Defines the aggregation engine and its collectors
pub mod map;

/// Defines the push-stream primitive
pub mod pipe;

pub use crate::iterable::{iterate, Iterable, Key};
pub use crate::map::{all, each, to_array, to_record, to_stream, to_stream_into, to_value, Options};
pub use crate::pipe::{pipe, PipeReceiver, PipeSender};
