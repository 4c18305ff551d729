// src/tool/base.rs

use crate::constants::{
    CONFIG_LAYER_KEY, DATABASE_FLAG, DEFAULT_PREFIX, HELP_FLAG, INFO_INPUT_KEY, INFO_OUTPUT_KEY,
    INFO_TIME_KEY, NB_CORES_FLAG, NO_PROGRESS_BAR_FLAG, OUTPUT_FLAG, PREFIX_FLAG, QUIET_FLAG,
    STATS_FLAG, VERSION_FLAG, key_of,
};
use crate::core::config_file;
use crate::core::options::{OptionSpec, OptionsParser};
use crate::core::paths;
use crate::core::property::{PropertyError, PropertyTree};
use crate::core::system_info::SystemInfo;
use crate::core::timing::TimeInfo;
use crate::core::visitors::{dump_readable, dump_xml};
use crate::system::dispatcher::ParallelDispatcher;
use crate::system::progress::{IteratorListener, ProgressBarListener, SilentListener};
use crate::tool::{LifecycleState, ToolError};
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

/// State shared by every tool: identity, options, the three property trees and
/// the dispatcher.
///
/// `output`, `info` and the parser live as long as the tool; `input` and the
/// dispatcher only exist once a run has started.
pub struct ToolBase {
    name: String,
    system: Arc<SystemInfo>,
    state: LifecycleState,
    parser: OptionsParser,
    input: Option<PropertyTree>,
    output: PropertyTree,
    info: PropertyTree,
    dispatcher: Option<Arc<ParallelDispatcher>>,
    time: TimeInfo,
    stats_enabled: bool,
    report_sink: Option<Box<dyn Write>>,
}

impl fmt::Debug for ToolBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolBase")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("info", &self.info)
            .field("dispatcher", &self.dispatcher)
            .field("stats_enabled", &self.stats_enabled)
            .finish_non_exhaustive()
    }
}

impl ToolBase {
    /// Creates the base of a tool named `name`, with the universal options
    /// registered. Tools add their own options through [`ToolBase::parser_mut`].
    pub fn new(name: &str, system: Arc<SystemInfo>) -> Self {
        let mut parser = OptionsParser::new(name);
        parser
            .add(OptionSpec::one_param(NB_CORES_FLAG, "number of cores (0 = all available)", false).with_default("0"))
            .add(OptionSpec::one_param(STATS_FLAG, "dump exec info into an XML file", false))
            .add(OptionSpec::no_param(QUIET_FLAG, "quiet execution", false))
            .add(OptionSpec::no_param(NO_PROGRESS_BAR_FLAG, "no progress bar", false))
            .add(OptionSpec::one_param(PREFIX_FLAG, "prefix to be appended to temp files", false))
            .add(OptionSpec::one_param(DATABASE_FLAG, "databank uri", false))
            .add(OptionSpec::one_param(OUTPUT_FLAG, "output uri", false))
            .add(OptionSpec::no_param(VERSION_FLAG, "display version information", false))
            .add(OptionSpec::no_param(HELP_FLAG, "display help about possible options", false));

        Self {
            name: name.to_string(),
            system,
            state: LifecycleState::Created,
            parser,
            input: None,
            output: PropertyTree::new(),
            info: PropertyTree::new(),
            dispatcher: None,
            time: TimeInfo::new(),
            stats_enabled: true,
            report_sink: None,
        }
    }

    /// The tool name, also used for the config file and stats record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared build and host information.
    pub fn system(&self) -> &SystemInfo {
        &self.system
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The option registry.
    pub fn parser(&self) -> &OptionsParser {
        &self.parser
    }

    /// The option registry, to register tool-specific options.
    pub fn parser_mut(&mut self) -> &mut OptionsParser {
        &mut self.parser
    }

    /// The input of the current run, `None` before it starts.
    pub fn input(&self) -> Option<&PropertyTree> {
        self.input.as_ref()
    }

    /// The input of the current run, for use inside `execute`.
    pub fn require_input(&self) -> Result<&PropertyTree, ToolError> {
        self.input
            .as_ref()
            .ok_or_else(|| ToolError::NotStarted(self.name.clone()))
    }

    /// Results of `execute`.
    pub fn output(&self) -> &PropertyTree {
        &self.output
    }

    /// Results of `execute`, filled by the tool.
    pub fn output_mut(&mut self) -> &mut PropertyTree {
        &mut self.output
    }

    /// The execution report: input, timings and output.
    pub fn info(&self) -> &PropertyTree {
        &self.info
    }

    /// The execution report, extended by composites.
    pub fn info_mut(&mut self) -> &mut PropertyTree {
        &mut self.info
    }

    /// The dispatcher of the current run.
    pub fn dispatcher(&self) -> Result<Arc<ParallelDispatcher>, ToolError> {
        self.dispatcher
            .clone()
            .ok_or_else(|| ToolError::NotStarted(self.name.clone()))
    }

    /// Whether `post_execute` writes the `-stats` file. Composites turn this
    /// off for their members and write the records themselves.
    pub fn set_stats_enabled(&mut self, enabled: bool) {
        self.stats_enabled = enabled;
    }

    /// Redirects the readable report (standard output by default).
    pub fn set_report_sink(&mut self, sink: Box<dyn Write>) {
        self.report_sink = Some(sink);
    }

    /// Moves the lifecycle one step forward to `to`.
    pub fn advance(&mut self, to: LifecycleState) -> Result<(), ToolError> {
        if self.state.next() != Some(to) {
            return Err(ToolError::InvalidState {
                tool: self.name.clone(),
                from: self.state,
                to,
            });
        }
        log::trace!("Tool '{}': {:?} -> {:?}", self.name, self.state, to);
        self.state = to;
        Ok(())
    }

    /// Records the elapsed time of a phase and advances to `to`.
    pub fn complete_phase(
        &mut self,
        to: LifecycleState,
        label: &str,
        elapsed: Duration,
    ) -> Result<(), ToolError> {
        self.time.record(label, elapsed);
        self.advance(to)
    }

    /// Takes ownership of the parsed input without starting a dispatcher.
    pub fn attach_input(&mut self, input: PropertyTree) -> Result<(), ToolError> {
        self.advance(LifecycleState::Parsed)?;
        self.input = Some(input);
        Ok(())
    }

    /// Stores the input and builds the dispatcher sized by `nb-cores`. A
    /// missing or non-positive value means the detected core count.
    pub fn begin_run(&mut self, input: PropertyTree) -> Result<(), ToolError> {
        let requested = match input.get_int(key_of(NB_CORES_FLAG)) {
            Ok(n) => n,
            Err(PropertyError::NotFound { .. }) => 0,
            Err(e) => return Err(e.into()),
        };
        let nb_cores = match usize::try_from(requested) {
            Ok(n) if n > 0 => n,
            _ => self.system.nb_cores,
        };
        self.attach_input(input)?;
        self.dispatcher = Some(Arc::new(ParallelDispatcher::new(nb_cores)?));
        log::debug!("Tool '{}' started with nb-cores = {}.", self.name, nb_cores);
        Ok(())
    }

    /// Default pre-processing.
    ///
    /// 1. The config file `~/.<name>` is appended as a layer, so every value
    ///    already in the input (command line, upstream stages) shadows it.
    /// 2. A missing or non-positive `nb-cores` is set to the detected number of cores.
    /// 3. A missing `prefix` gets the default temp-file prefix.
    /// 4. The final input is recorded into `info`.
    pub fn pre_execute(&mut self) -> Result<(), ToolError> {
        let input = self
            .input
            .as_mut()
            .ok_or_else(|| ToolError::NotStarted(self.name.clone()))?;

        if let Some(home) = &self.system.home_directory {
            let path = paths::tool_config_path(home, &self.name);
            match config_file::load_config_file(&path) {
                Ok(Some(config)) => {
                    log::debug!("Merging config file '{}'.", path.display());
                    input.add_tree(1, CONFIG_LAYER_KEY, config);
                }
                Ok(None) => {}
                Err(e) => log::warn!("Ignoring config file: {}", e),
            }
        }

        let nb_cores_key = key_of(NB_CORES_FLAG);
        let nb_cores = match input.get_int(nb_cores_key) {
            Ok(n) => n,
            Err(PropertyError::NotFound { .. }) => 0,
            Err(e) => return Err(e.into()),
        };
        if nb_cores <= 0 {
            let detected = i64::try_from(self.system.nb_cores).unwrap_or(i64::MAX);
            input.set_int(nb_cores_key, detected)?;
        }

        let prefix_key = key_of(PREFIX_FLAG);
        if !input.contains(prefix_key) {
            input.add(1, prefix_key, DEFAULT_PREFIX);
        }

        self.info.add_tree(1, INFO_INPUT_KEY, input.clone());
        Ok(())
    }

    /// Default post-processing: timing and output go into `info`, then the
    /// stats file (`-stats`) and the readable report (unless `-quiet`) are written.
    pub fn post_execute(&mut self) -> Result<(), ToolError> {
        self.info.add_tree(1, INFO_TIME_KEY, self.time.properties());
        self.info.add_tree(1, INFO_OUTPUT_KEY, self.output.clone());

        let input = self
            .input
            .as_ref()
            .ok_or_else(|| ToolError::NotStarted(self.name.clone()))?;

        if self.stats_enabled
            && let Ok(stats) = input.get_str(key_of(STATS_FLAG))
        {
            let path = paths::expand_user_path(stats)?;
            dump_xml(&self.info, &path, &self.name, false)?;
        }

        if !input.contains(key_of(QUIET_FLAG)) {
            let mut report = PropertyTree::new();
            report.add_tree(0, self.name.as_str(), self.info.clone());
            match self.report_sink.as_mut() {
                Some(sink) => dump_readable(&report, sink)?,
                None => dump_readable(&report, io::stdout().lock())?,
            }
        }
        Ok(())
    }

    /// See [`crate::tool::Tool::create_iterator_listener`].
    pub fn create_iterator_listener(&self, count: u64, message: &str) -> Arc<dyn IteratorListener> {
        let silent = self.input.as_ref().is_none_or(|input| {
            input.contains(key_of(QUIET_FLAG)) || input.contains(key_of(NO_PROGRESS_BAR_FLAG))
        });
        if silent {
            Arc::new(SilentListener)
        } else {
            Arc::new(ProgressBarListener::new(count, message))
        }
    }
}
