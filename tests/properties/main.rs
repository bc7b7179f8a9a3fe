//! Property test suite entry point.

mod ranking_tests;
mod text_tests;
