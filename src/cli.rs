// src/cli.rs

use clap::{ArgAction, Parser};

/// stagekit: run a processing stage, or a pipeline of stages.
///
/// The first argument names the stage; every following argument is handed to
/// the stage's own option parser, which uses single-dash flags:
///
///    stagekit seqstats -db reads.fa -nb-cores 4 -stats stats.xml
///    stagekit pipeline -db reads.fa -quiet
///    stagekit gc -help
///
/// Only the long `--help` and `--version` belong to the binary; `-h` and `-V`
/// reach the stage untouched.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,

    /// Print version.
    #[arg(long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// The stage to run. Lists the available stages when omitted.
    pub tool: Option<String>,

    /// Options of the stage, e.g. `-db reads.fa -nb-cores 4`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
