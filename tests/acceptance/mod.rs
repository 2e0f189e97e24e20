//! Integration tests for igc-tsn acceptance testing.
//!
//! - Gate schedule programming and base-time synchronization
//! - Deferred dispatch, coalescing, and concurrent configuration changes

mod common;
mod dispatch_test;
mod schedule_test;
