// src/constants.rs

/// Number of cores for the dispatcher; `0` lets the dispatcher auto-detect.
pub const NB_CORES_FLAG: &str = "-nb-cores";

/// Path of the structured (XML) execution report.
pub const STATS_FLAG: &str = "-stats";

/// Suppresses the readable report on standard output.
pub const QUIET_FLAG: &str = "-quiet";

/// Replaces progress bars by silent listeners.
pub const NO_PROGRESS_BAR_FLAG: &str = "-no-progress-bar";

/// Prefix for temporary files.
pub const PREFIX_FLAG: &str = "-prefix";

/// Input databank.
pub const DATABASE_FLAG: &str = "-db";

/// Output location.
pub const OUTPUT_FLAG: &str = "-out";

/// Prints the option listing instead of running.
pub const HELP_FLAG: &str = "-help";

/// Prints the library description instead of running.
pub const VERSION_FLAG: &str = "-version";

/// Value given to `prefix` by `pre_execute` when it was not set.
pub const DEFAULT_PREFIX: &str = "tmp.";

/// Name of the root element of a stats document.
pub const XML_ROOT_ELEMENT: &str = "properties";

/// One level of indentation in rendered reports and help listings.
pub const INDENT: &str = "    ";

/// Property keys under which a tool files its report sections.
pub const INFO_INPUT_KEY: &str = "input";
/// Section of `info` holding phase timings.
pub const INFO_TIME_KEY: &str = "time";
/// Section of `info` holding the output tree.
pub const INFO_OUTPUT_KEY: &str = "output";
/// Section of `input` holding the config file entries.
pub const CONFIG_LAYER_KEY: &str = "config";

/// Turns a flag name into the property key it is stored under.
pub fn key_of(flag: &str) -> &str {
    flag.trim_start_matches('-')
}
