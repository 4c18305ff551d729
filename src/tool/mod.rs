//! # Tool Lifecycle
//!
//! Every command-line stage follows the same fixed sequence:
//!
//! ```text
//! parse -> pre_execute -> execute -> post_execute -> report
//! ```
//!
//! A concrete tool embeds a [`ToolBase`] (name, option registry, input/output/info
//! trees, dispatcher) and implements [`Tool::execute`]; the rest of the sequence
//! is provided. [`ToolComposite`] chains several tools, piping the output of one
//! into the input of the next.
//!
//! Failures of `execute` are never caught or translated here: they reach the
//! caller exactly as the tool produced them.

/// State and default phases shared by every tool.
pub mod base;
/// Sequential chaining of tools.
pub mod composite;

pub use base::ToolBase;
pub use composite::{ToolComposite, ToolHandle};

use crate::core::options::ParseOutcome;
use crate::core::paths::PathError;
use crate::core::property::{PropertyError, PropertyTree};
use crate::core::visitors::ReportError;
use crate::system::dispatcher::DispatchError;
use crate::system::progress::IteratorListener;
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Failures of the lifecycle itself. Errors raised by `execute` are not
/// wrapped and keep their own type.
#[derive(Error, Debug)]
pub enum ToolError {
    /// A phase was entered out of order, e.g. a second run.
    #[error("Tool '{tool}' cannot move from {from:?} to {to:?}.")]
    InvalidState {
        /// Name of the tool.
        tool: String,
        /// State the tool was in.
        from: LifecycleState,
        /// State that was requested.
        to: LifecycleState,
    },
    /// The input was requested before any run.
    #[error("Tool '{0}' has no input: it has not been run yet.")]
    NotStarted(String),
    /// A property of the input could not be read or updated.
    #[error(transparent)]
    Property(#[from] PropertyError),
    /// A report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// The stats path could not be expanded.
    #[error(transparent)]
    Path(#[from] PathError),
    /// The worker pool could not be started.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// The phases of a run. A tool only ever moves forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Built, never run.
    Created,
    /// Input stored.
    Parsed,
    /// Input augmented.
    PreExecuted,
    /// Output filled.
    Executed,
    /// Reports emitted.
    PostExecuted,
}

impl LifecycleState {
    /// The only state reachable from `self`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Parsed),
            Self::Parsed => Some(Self::PreExecuted),
            Self::PreExecuted => Some(Self::Executed),
            Self::Executed => Some(Self::PostExecuted),
            Self::PostExecuted => None,
        }
    }
}

/// What `run_args` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The full lifecycle ran; the output is available from the tool.
    Completed,
    /// `-help` was given; nothing ran.
    Help(String),
    /// `-version` was given; nothing ran.
    Version(PropertyTree),
}

/// A command-line stage.
pub trait Tool {
    /// The shared state of the tool.
    fn base(&self) -> &ToolBase;

    /// The shared state of the tool, mutably.
    fn base_mut(&mut self) -> &mut ToolBase;

    /// The domain work of the tool. It may use the dispatcher and progress
    /// listeners of its base and fills the output tree.
    fn execute(&mut self) -> Result<()>;

    /// The tool name.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Augments the input: config file layer, core count, temp-file prefix.
    fn pre_execute(&mut self) -> Result<()> {
        self.base_mut().pre_execute()?;
        Ok(())
    }

    /// Completes the info tree and emits the reports.
    fn post_execute(&mut self) -> Result<()> {
        self.base_mut().post_execute()?;
        Ok(())
    }

    /// Parses `args` with this tool's own options, then runs it.
    fn run_args(&mut self, args: &[String]) -> Result<RunOutcome> {
        match self.base().parser().parse(args)? {
            ParseOutcome::Help(text) => Ok(RunOutcome::Help(text)),
            ParseOutcome::Version => Ok(RunOutcome::Version(
                self.base().system().library_properties(),
            )),
            ParseOutcome::Properties(input) => {
                self.run(input)?;
                Ok(RunOutcome::Completed)
            }
        }
    }

    /// Runs the full lifecycle on an already parsed input and returns the output.
    fn run(&mut self, input: PropertyTree) -> Result<&PropertyTree> {
        self.base_mut().begin_run(input)?;

        let start = Instant::now();
        self.pre_execute()?;
        self.base_mut()
            .complete_phase(LifecycleState::PreExecuted, "pre_execute", start.elapsed())?;

        let start = Instant::now();
        self.execute()?;
        self.base_mut()
            .complete_phase(LifecycleState::Executed, "execute", start.elapsed())?;

        self.post_execute()?;
        self.base_mut().advance(LifecycleState::PostExecuted)?;

        log::debug!("Tool '{}' completed.", self.name());
        Ok(self.base().output())
    }

    /// A progress reporter for `count` iterations; silent under `-quiet` or
    /// `-no-progress-bar`.
    fn create_iterator_listener(&self, count: u64, message: &str) -> Arc<dyn IteratorListener> {
        self.base().create_iterator_listener(count, message)
    }
}
