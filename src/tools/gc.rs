// src/tools/gc.rs

use crate::constants::{DATABASE_FLAG, key_of};
use crate::core::options::OptionSpec;
use crate::core::system_info::SystemInfo;
use crate::tool::{Tool, ToolBase};
use crate::tools::fasta;
use crate::tools::seqstats::{NB_SEQUENCES_KEY, TOTAL_LENGTH_KEY};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stage name.
pub const NAME: &str = "gc";

/// Output key: GC share of the A/C/G/T/U residues, in percent.
pub const GC_PERCENT_KEY: &str = "gc_percent";
/// Output key: mean sequence length, from upstream counts.
pub const MEAN_LENGTH_KEY: &str = "mean_length";

/// Computes the GC content of the `-db` databank.
///
/// When run downstream of `seqstats`, the upstream counts found in the input
/// are used to also report the mean sequence length.
#[derive(Debug)]
pub struct GcContent {
    base: ToolBase,
}

impl GcContent {
    /// A `gc` stage with a mandatory `-db`.
    pub fn new(system: Arc<SystemInfo>) -> Self {
        let mut base = ToolBase::new(NAME, system);
        base.parser_mut()
            .add(OptionSpec::one_param(DATABASE_FLAG, "FASTA databank to read", true));
        Self { base }
    }
}

impl Tool for GcContent {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    fn execute(&mut self) -> Result<()> {
        let input = self.base.require_input()?;
        let sequences = fasta::read_fasta(Path::new(input.get_str(key_of(DATABASE_FLAG))?))?;
        let upstream = input
            .get_int(NB_SEQUENCES_KEY)
            .ok()
            .zip(input.get_int(TOTAL_LENGTH_KEY).ok());

        let gc = AtomicU64::new(0);
        let called = AtomicU64::new(0);
        let listener = self.create_iterator_listener(sequences.len() as u64, "gc content");
        self.base.dispatcher()?.iterate(sequences, |seq| {
            let mut local_gc = 0;
            let mut local_called = 0;
            for base in seq.residues.iter().map(u8::to_ascii_uppercase) {
                match base {
                    b'G' | b'C' => {
                        local_gc += 1;
                        local_called += 1;
                    }
                    b'A' | b'T' | b'U' => local_called += 1,
                    _ => {}
                }
            }
            gc.fetch_add(local_gc, Ordering::Relaxed);
            called.fetch_add(local_called, Ordering::Relaxed);
            listener.inc(1);
        });
        listener.finish();

        let called = called.into_inner();
        let percent = if called == 0 {
            0.0
        } else {
            gc.into_inner() as f64 * 100.0 / called as f64
        };

        let output = self.base.output_mut();
        output.add_fmt(1, GC_PERCENT_KEY, format_args!("{:.2}", percent));
        if let Some((nb, total)) = upstream
            && nb > 0
        {
            output.add_fmt(1, MEAN_LENGTH_KEY, format_args!("{:.2}", total as f64 / nb as f64));
        }
        Ok(())
    }
}
