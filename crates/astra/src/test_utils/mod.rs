//! Shared fakes for unit tests

mod mocks;

pub use mocks::*;
