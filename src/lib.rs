//! `stagekit`: a small framework for command-line processing stages.
//!
//! A stage ([`tool::Tool`]) parses its options into a [`core::property::PropertyTree`],
//! enriches it, does its work on a parallel dispatcher and reports what it did.
//! Stages can be chained with [`tool::ToolComposite`].

/// Command-line surface of the `stagekit` binary.
pub mod cli;
/// Universal flags and report keys.
pub mod constants;
/// Property trees, their exporters, option parsing and configuration.
pub mod core;
pub mod system;
pub mod tool;
pub mod tools;
