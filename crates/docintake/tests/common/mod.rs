//! Shared test utilities for docintake integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated intake/success/error directories
//! - `FakeInterpreter`, a scripted `CommandRunner` that counts extractions

pub mod harness;

pub use harness::{marker_output, FakeInterpreter, TestHarness};
