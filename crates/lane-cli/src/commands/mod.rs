//! CLI subcommand implementations.

pub mod averages;
pub mod capture;
pub mod catalog;
pub mod check;
pub mod compare;
pub mod consistency;
pub mod history;
pub mod results;
pub mod status;
pub mod time;
pub mod top;

mod render;

#[cfg(test)]
mod fixtures;
