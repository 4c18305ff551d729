// src/bin/stagekit.rs

//! The `stagekit` binary: picks a stage by name and runs it on the
//! remaining arguments.

use anyhow::{Result, bail};
use clap::Parser;
use colored::*;
use stagekit::{
    cli::Cli,
    core::{system_info::SystemInfo, visitors::dump_readable},
    tool::{RunOutcome, ToolHandle},
    tools,
};
use std::io;
use std::sync::Arc;

// --- Tool Definition and Registry ---

/// A runnable stage: its name, aliases and how to build it.
struct ToolDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    about: &'static str,
    build: fn(Arc<SystemInfo>) -> ToolHandle,
}

/// Every stage the binary knows about.
static TOOL_REGISTRY: &[ToolDefinition] = &[
    ToolDefinition {
        name: "seqstats",
        aliases: &["stats"],
        about: "count the sequences and residues of a FASTA databank",
        build: tools::seqstats,
    },
    ToolDefinition {
        name: "gc",
        aliases: &[],
        about: "compute the GC content of a FASTA databank",
        build: tools::gc,
    },
    ToolDefinition {
        name: "pipeline",
        aliases: &["all"],
        about: "seqstats then gc, the second fed with the output of the first",
        build: tools::pipeline,
    },
];

fn find_tool(name: &str) -> Option<&'static ToolDefinition> {
    TOOL_REGISTRY
        .iter()
        .find(|tool| tool.name == name || tool.aliases.contains(&name))
}

fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let Some(name) = cli.tool else {
        println!("{}", "Available tools:".bold());
        for tool in TOOL_REGISTRY {
            println!("  {:<10} {}", tool.name.cyan(), tool.about);
        }
        return Ok(());
    };
    let Some(definition) = find_tool(&name) else {
        bail!("Unknown tool '{}'. Run without arguments to list the tools.", name);
    };

    let system = Arc::new(SystemInfo::detect());
    let tool = (definition.build)(system);
    let outcome = tool.borrow_mut().run_args(&cli.args)?;

    match outcome {
        RunOutcome::Completed => {}
        RunOutcome::Help(text) => println!("{}", text),
        RunOutcome::Version(library) => dump_readable(&library, io::stdout().lock())?,
    }
    Ok(())
}
