//! Shared helpers for tests in the param-store workspace.

pub mod env;
