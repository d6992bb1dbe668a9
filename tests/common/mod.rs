//! Common test utilities for pipeline integration tests
//!
//! This module provides record builders, scripted model replies and a
//! harness that wires a coordinator to a JSONL store in a temp directory.

#![allow(dead_code)]

pub mod harness;
pub mod records;

pub use harness::Harness;
pub use records::{candidate, classification_reply, classified};
