// src/tools/seqstats.rs

use crate::constants::{DATABASE_FLAG, key_of};
use crate::core::options::OptionSpec;
use crate::core::system_info::SystemInfo;
use crate::tool::{Tool, ToolBase};
use crate::tools::fasta;
use anyhow::Result;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// Stage name.
pub const NAME: &str = "seqstats";

/// Output key: number of sequences.
pub const NB_SEQUENCES_KEY: &str = "nb_sequences";
/// Output key: sum of the sequence lengths.
pub const TOTAL_LENGTH_KEY: &str = "total_length";
/// Output key: length of the longest sequence.
pub const MAX_LENGTH_KEY: &str = "max_length";
/// Output key: identifier of the longest sequence.
pub const LONGEST_ID_KEY: &str = "longest_sequence";

/// Counts the sequences and residues of the `-db` databank.
#[derive(Debug)]
pub struct SeqStats {
    base: ToolBase,
}

impl SeqStats {
    /// A `seqstats` stage with a mandatory `-db`.
    pub fn new(system: Arc<SystemInfo>) -> Self {
        let mut base = ToolBase::new(NAME, system);
        base.parser_mut()
            .add(OptionSpec::one_param(DATABASE_FLAG, "FASTA databank to read", true));
        Self { base }
    }
}

impl Tool for SeqStats {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    fn execute(&mut self) -> Result<()> {
        let db = self.base.require_input()?.get_str(key_of(DATABASE_FLAG))?;
        let sequences = fasta::read_fasta(Path::new(db))?;

        let dispatcher = self.base.dispatcher()?;
        let listener = self.create_iterator_listener(sequences.len() as u64, "counting residues");

        // Ties keep the earliest sequence.
        let (total, longest) = dispatcher.install(|| {
            sequences
                .par_iter()
                .map(|seq| {
                    listener.inc(1);
                    (seq.len(), Some(seq))
                })
                .reduce(
                    || (0, None),
                    |(total_a, longest_a), (total_b, longest_b)| {
                        let longest = match (longest_a, longest_b) {
                            (Some(a), Some(b)) if b.len() > a.len() => Some(b),
                            (Some(a), _) => Some(a),
                            (None, b) => b,
                        };
                        (total_a + total_b, longest)
                    },
                )
        });
        listener.finish();

        log::debug!(
            "{}: {} sequences, {} residues on {} cores.",
            NAME,
            sequences.len(),
            total,
            dispatcher.nb_cores()
        );
        self.base
            .output_mut()
            .add(1, NB_SEQUENCES_KEY, sequences.len().to_string())
            .add(1, TOTAL_LENGTH_KEY, total.to_string());
        if let Some(longest) = longest {
            self.base
                .output_mut()
                .add(1, MAX_LENGTH_KEY, longest.len().to_string())
                .add(1, LONGEST_ID_KEY, longest.id.as_str());
        }
        Ok(())
    }
}
