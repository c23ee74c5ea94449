//! Utilities shared by the Kotatsu binaries and tests.

pub mod logger;
pub mod time;
