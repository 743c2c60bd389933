//! Provider backends.
//!
//! The engine talks to resources through the [`provision::Provider`] trait;
//! this module hosts the concrete backends the CLI can wire in. Only the
//! local state-file backend ships today.

pub mod local;

pub use local::LocalProvider;
