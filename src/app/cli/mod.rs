//! CLI module containing argument parsing and related functionality

pub mod args;
pub mod config;
pub mod parsing;
pub mod validation;

pub use args::Args;
pub use parsing::ParseFailure;

#[cfg(test)]
mod tests;
