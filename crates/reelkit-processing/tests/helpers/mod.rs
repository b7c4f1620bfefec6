//! Shared fixtures and test doubles for the processing integration tests.
//!
//! Run from workspace root: `cargo test -p reelkit-processing`.

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_host;
pub mod mock_uploader;
