// src/core/mod.rs

pub mod config_file;
/// Declarative option registry and parser.
pub mod options;
/// Config-file location and user path expansion.
pub mod paths;
pub mod property;
/// Build metadata and host facts.
pub mod system_info;
/// Per-phase elapsed times.
pub mod timing;
pub mod visitors;
