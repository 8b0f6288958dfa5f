// src/errors.rs

//! Crate-wide error aliases.
//!
//! The pool itself defines no error kinds of its own: enqueueing cannot fail,
//! and task failures are opaque settlements rather than errors the pool
//! surfaces. This module is a thin wrapper around `anyhow` and gives a single
//! place to grow more structured error types if the crate ever needs them.

pub use anyhow::{Error, Result};
