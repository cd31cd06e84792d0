//! flowctl-core
//!
//! `flowctl-core` provides primitives for composing deferred, asynchronous computations.
//!
//! What is it?
//! ---
//!
//! `Flowctl` is a library for describing a computation as a set of named branches wired
//! together through single-assignment values, without manually interleaving suspension
//! points.  It is useful for a number of different applications:
//!
//! * Fan-out/fan-in orchestration of async work.
//! * Pipelines where stages feed each other through deferred values.
//! * Bounding the concurrency of expensive operations.
//! * Cooperative short-circuiting across concurrent work.
//!
//! How to Use It?
//! ---
//!
//! Flowctl defines a `Prop` struct which represents a deferred value.  `Prop` objects are
//! accessed with three simple functions:
//!
//! 1. `lift` - Lift takes a concrete value and lifts it into an assigned Prop
//! 2. `set` - Set assigns an unset Prop exactly once, waking everything awaiting it
//! 3. `wait` - Wait suspends the caller until the Prop is assigned
//!
//! Branches are composed with three combinators: `All` runs branches concurrently,
//! `Each` runs them strictly in order, and `Any` runs only the branches whose bindings
//! are present.  Branch inputs are literals or Props; branch outputs land in Props,
//! which in turn feed other branches.
//!
//! Example - Hello World!
//! ---
//! ```rust
//! use flowctl::branch::{Flow, Source};
//! use flowctl::combine::All;
//! use flowctl::prop::Prop;
//!
//! let hello = Prop::new();
//! let world = Prop::new();
//! let greeting = Prop::new();
//!
//! let combo = All::new()
//!     .branch("hello", (), |_| async { Ok(Flow::Continue("Hello".to_string())) },
//!             hello.clone())
//!     .branch("world", (), |_| async { Ok(Flow::Continue("World!".to_string())) },
//!             world.clone())
//!     .branch("greet", (Source::prop(&hello), Source::prop(&world)),
//!             |(h, w): (String, String)| async move {
//!                 Ok(Flow::Continue(format!("{} {}", h, w)))
//!             },
//!             greeting.clone());
//!
//! futures::executor::block_on(combo.run()).unwrap();
//! assert_eq!(greeting.get(), Some("Hello World!".to_string()));
//! ```

#![warn(missing_docs)]

/// Contains the crate-wide error taxonomy
pub mod error;

/// Contains the Prop single-assignment deferred value
pub mod prop;

/// Contains the typed seams of a branch: inputs, outputs, break signaling
pub mod branch;

/// Contains the All/Each/Any record combinators
pub mod combine;

/// Contains the concurrency limiter
pub mod limit;

/// Contains helpers for invoking lazily resolved functions
pub mod call;

pub use crate::error::{Error, Result};
pub use crate::prop::Prop;
