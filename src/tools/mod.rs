//! # Pipeline Stages
//!
//! Concrete tools built on the lifecycle framework, and the composite that
//! chains them. They double as end-to-end exercises of the framework.

/// Minimal FASTA reader used by the stages.
pub mod fasta;
/// GC content stage.
pub mod gc;
/// Sequence counting stage.
pub mod seqstats;

use crate::core::system_info::SystemInfo;
use crate::tool::{ToolComposite, ToolHandle};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Name of the `seqstats` then `gc` composite.
pub const PIPELINE_NAME: &str = "pipeline";

/// A new `seqstats` stage.
pub fn seqstats(system: Arc<SystemInfo>) -> ToolHandle {
    Rc::new(RefCell::new(seqstats::SeqStats::new(system)))
}

/// A new `gc` stage.
pub fn gc(system: Arc<SystemInfo>) -> ToolHandle {
    Rc::new(RefCell::new(gc::GcContent::new(system)))
}

/// `seqstats` followed by `gc`.
pub fn pipeline(system: Arc<SystemInfo>) -> ToolHandle {
    let mut composite = ToolComposite::new(PIPELINE_NAME, Arc::clone(&system));
    composite
        .add(Some(seqstats(Arc::clone(&system))))
        .add(Some(gc(system)));
    Rc::new(RefCell::new(composite))
}
