//! Generic test suites runnable against every feed variant.
//!
//! The bodies live here so integration tests can instantiate them for each
//! (feed, lock) combination instead of copying the assertions four times.

pub mod feed_stress_tests;
