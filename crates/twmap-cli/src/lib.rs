//! CLI library components for the `twmap` binary.

pub mod logging;
