//! levelup: a daily habit checklist with points and levels.
//!
//! The engine lives in [`ops`] and works on a [`model::ProgressState`]
//! passed in by the caller; [`io`] loads and saves that state, and [`cli`]
//! wires both to the `lu` binary.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod util;
