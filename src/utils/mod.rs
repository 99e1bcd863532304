//! Utility modules shared by the binary.

pub mod logger;
