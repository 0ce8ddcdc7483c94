//! Subcommands of the lend CLI.

pub mod resource;
