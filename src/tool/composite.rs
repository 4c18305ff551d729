// src/tool/composite.rs

use crate::constants::{STATS_FLAG, key_of};
use crate::core::options::ParseOutcome;
use crate::core::paths;
use crate::core::property::{Property, PropertyTree};
use crate::core::system_info::SystemInfo;
use crate::core::visitors::dump_xml;
use crate::tool::{LifecycleState, RunOutcome, Tool, ToolBase};
use anyhow::{Result, anyhow};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Shared handle on a tool. A tool lives as long as its last holder.
pub type ToolHandle = Rc<RefCell<dyn Tool>>;

/// A tool that runs other tools in sequence.
///
/// For each member, in registration order, the raw arguments are parsed with
/// the member's own options. From the second member on, the previous member's
/// output is merged **before** the freshly parsed options, so upstream results
/// shadow same-named command-line values. Each member's info is appended to
/// the composite's info once it has run.
pub struct ToolComposite {
    base: ToolBase,
    tools: Vec<ToolHandle>,
}

impl std::fmt::Debug for ToolComposite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .tools
            .iter()
            .map(|t| match t.try_borrow() {
                Ok(tool) => tool.name().to_string(),
                Err(_) => "<running>".to_string(),
            })
            .collect();
        f.debug_struct("ToolComposite")
            .field("base", &self.base)
            .field("tools", &names)
            .finish()
    }
}

impl ToolComposite {
    /// An empty composite named `name`.
    pub fn new(name: &str, system: Arc<SystemInfo>) -> Self {
        Self {
            base: ToolBase::new(name, system),
            tools: Vec::new(),
        }
    }

    /// Retains `tool` and appends it to the members. `None` is ignored.
    pub fn add(&mut self, tool: Option<ToolHandle>) -> &mut Self {
        if let Some(tool) = tool {
            self.tools.push(tool);
        }
        self
    }

    /// Members in registration order.
    pub fn tools(&self) -> &[ToolHandle] {
        &self.tools
    }

    /// The help listings of every member, in registration order.
    pub fn help(&self) -> String {
        self.tools
            .iter()
            .filter_map(|t| t.try_borrow().ok().map(|tool| tool.base().parser().help()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Tool for ToolComposite {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    /// All the work happens in `run_args`.
    fn execute(&mut self) -> Result<()> {
        Ok(())
    }

    fn pre_execute(&mut self) -> Result<()> {
        Ok(())
    }

    /// Writes one stats record per member into the `-stats` file: the first
    /// record starts a new document, the following ones are appended.
    fn post_execute(&mut self) -> Result<()> {
        let Some(input) = self.base.input() else {
            return Ok(());
        };
        let Ok(stats) = input.get_str(key_of(STATS_FLAG)) else {
            return Ok(());
        };
        let path = paths::expand_user_path(stats)?;

        let records = self.base.info().entries().iter().filter_map(|entry| match entry {
            Property::Tree {
                key: Some(name),
                tree,
                ..
            } => Some((name.as_str(), tree)),
            _ => None,
        });
        for (index, (name, tree)) in records.enumerate() {
            dump_xml(tree, &path, name, index > 0)?;
        }
        Ok(())
    }

    fn run_args(&mut self, args: &[String]) -> Result<RunOutcome> {
        let mut previous_output: Option<PropertyTree> = None;

        for (index, handle) in self.tools.iter().enumerate() {
            let mut tool = handle
                .try_borrow_mut()
                .map_err(|_| anyhow!("A member of '{}' is already running.", self.base.name()))?;

            let fresh_input = match tool.base().parser().parse(args)? {
                ParseOutcome::Properties(tree) => tree,
                ParseOutcome::Help(_) => {
                    drop(tool);
                    return Ok(RunOutcome::Help(self.help()));
                }
                ParseOutcome::Version => {
                    return Ok(RunOutcome::Version(
                        self.base.system().library_properties(),
                    ));
                }
            };

            if index == 0 {
                self.base.attach_input(fresh_input.clone())?;
            }

            // Upstream output first: it takes precedence over this member's
            // own command-line values.
            let actual_input = match previous_output.take() {
                Some(upstream) => {
                    let mut merged = PropertyTree::new();
                    merged.merge(upstream, 1).merge(fresh_input, 1);
                    merged
                }
                None => fresh_input,
            };

            log::debug!(
                "Composite '{}': running member #{} '{}'.",
                self.base.name(),
                index,
                tool.name()
            );
            tool.base_mut().set_stats_enabled(false);
            let output = tool.run(actual_input)?.clone();
            previous_output = Some(output);

            let member_info = tool.base().info().clone();
            self.base.info_mut().add_tree(1, tool.name(), member_info);
        }

        if self.base.state() == LifecycleState::Created {
            self.base.attach_input(PropertyTree::new())?;
        }
        if let Some(output) = previous_output {
            *self.base.output_mut() = output;
        }

        self.base.advance(LifecycleState::PreExecuted)?;
        self.base.advance(LifecycleState::Executed)?;
        self.post_execute()?;
        self.base.advance(LifecycleState::PostExecuted)?;
        Ok(RunOutcome::Completed)
    }
}
