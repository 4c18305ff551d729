// src/core/system_info.rs

use crate::core::property::PropertyTree;
use std::path::PathBuf;
use std::thread;

/// Build metadata and host facts shared by every tool of a process.
///
/// Built once at start-up with [`SystemInfo::detect`] and handed to the tools
/// as an `Arc<SystemInfo>`. Tests build their own with a temporary home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// Crate version.
    pub version: String,
    /// UTC date of the build.
    pub build_date: String,
    /// Target triple.
    pub build_system: String,
    /// `rustc --version` of the build.
    pub build_compiler: String,
    /// Cargo profile.
    pub build_options: String,
    /// Where per-tool config files are looked up.
    pub home_directory: Option<PathBuf>,
    /// Hardware parallelism.
    pub nb_cores: usize,
}

impl SystemInfo {
    /// Collects build metadata from the compile-time environment and host
    /// facts from the running system.
    pub fn detect() -> Self {
        let nb_cores = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let home_directory = dirs::home_dir();
        log::debug!(
            "System info: {} cores, home directory {:?}",
            nb_cores,
            home_directory
        );

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_date: env!("STAGEKIT_BUILD_DATE").to_string(),
            build_system: env!("STAGEKIT_BUILD_SYSTEM").to_string(),
            build_compiler: env!("STAGEKIT_BUILD_COMPILER").to_string(),
            build_options: env!("STAGEKIT_BUILD_OPTIONS").to_string(),
            home_directory,
            nb_cores,
        }
    }

    /// A `SystemInfo` with fixed host facts; build metadata is still the real one.
    pub fn with_host(home_directory: Option<PathBuf>, nb_cores: usize) -> Self {
        Self {
            home_directory,
            nb_cores,
            ..Self::detect()
        }
    }

    /// The library description record shown by `-version`.
    pub fn library_properties(&self) -> PropertyTree {
        let mut build = PropertyTree::new();
        build
            .add(1, "version", self.version.as_str())
            .add(1, "build_date", self.build_date.as_str())
            .add(1, "build_system", self.build_system.as_str())
            .add(1, "build_compiler", self.build_compiler.as_str())
            .add(1, "build_options", self.build_options.as_str());

        let mut tree = PropertyTree::new();
        tree.add_tree(0, env!("CARGO_PKG_NAME"), build);
        tree
    }
}
