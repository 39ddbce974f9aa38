//! Testability harness utilities.
//!
//! Synthetic audio and fixture artifacts shared by the unit tests, the
//! integration tests under `tests/` and the CLI smoke tests. Nothing here is
//! used by the prediction path itself.

pub mod artifacts;
pub mod signals;
