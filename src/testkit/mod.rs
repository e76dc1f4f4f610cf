//! Test support utilities.
//!
//! Enabled for unit tests and via the `testkit` feature for integration
//! tests and downstream consumers that need realistic fixtures.

pub mod domain;
