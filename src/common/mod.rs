//! Shared utilities used across sensr.

pub mod jacobian;
