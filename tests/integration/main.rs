//! Integration test suite entry point.

mod native_tests;
mod worker_tests;
