//! Subcommand implementations.

pub mod culto;
pub mod proxy;
