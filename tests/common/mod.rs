// tests/common/mod.rs

#![allow(dead_code, unreachable_pub)]

use stagekit::core::options::OptionSpec;
use stagekit::core::property::PropertyTree;
use stagekit::core::system_info::SystemInfo;
use stagekit::tool::{Tool, ToolBase, ToolHandle};
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("probe '{0}' was told to fail")]
pub struct ProbeFailure(pub String);

/// A tool that records the input it was executed with and emits fixed outputs.
#[derive(Debug)]
pub struct Probe {
    base: ToolBase,
    pub seen_input: Option<PropertyTree>,
    pub emit: Vec<(String, String)>,
    pub fail: bool,
}

impl Probe {
    pub fn new(name: &str, system: Arc<SystemInfo>) -> Self {
        let mut base = ToolBase::new(name, system);
        base.parser_mut()
            .add(OptionSpec::one_param("-x", "first probe value", false))
            .add(OptionSpec::one_param("-y", "second probe value", false));
        Self {
            base,
            seen_input: None,
            emit: Vec::new(),
            fail: false,
        }
    }

    pub fn emitting(mut self, key: &str, value: &str) -> Self {
        self.emit.push((key.to_string(), value.to_string()));
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn into_handle(self) -> Rc<RefCell<Probe>> {
        Rc::new(RefCell::new(self))
    }
}

impl Tool for Probe {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    fn execute(&mut self) -> anyhow::Result<()> {
        self.seen_input = Some(self.base.require_input()?.clone());
        if self.fail {
            return Err(ProbeFailure(self.base.name().to_string()).into());
        }
        for (key, value) in &self.emit {
            self.base.output_mut().add(1, key.as_str(), value.as_str());
        }
        Ok(())
    }
}

/// Unsizes a concrete probe handle into a shared tool handle.
pub fn as_tool(probe: &Rc<RefCell<Probe>>) -> ToolHandle {
    probe.clone()
}

/// A `SystemInfo` without a home directory, so no config file is picked up.
pub fn system(nb_cores: usize) -> Arc<SystemInfo> {
    Arc::new(SystemInfo::with_host(None, nb_cores))
}

pub fn system_with_home(home: PathBuf, nb_cores: usize) -> Arc<SystemInfo> {
    Arc::new(SystemInfo::with_host(Some(home), nb_cores))
}

pub fn args(params: &[&str]) -> Vec<String> {
    params.iter().map(|s| s.to_string()).collect()
}

/// A cloneable in-memory report sink.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
