//! Swim result capture CLI library.
//!
//! This crate provides the CLI interface for capturing and reviewing results.

mod cli;
pub mod commands;
mod config;

pub use cli::{CatalogAction, Cli, Commands, FilterArgs, TimeAction};
pub use config::Config;
