// src/tools/fasta.rs

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Failure to load a databank.
#[derive(Error, Debug)]
pub enum FastaError {
    /// The file could not be read.
    #[error("Could not read databank '{path}': {source}")]
    Read {
        /// Path of the databank.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    #[error("Databank '{path}' has sequence data before any '>' header (line {line}).")]
    /// Residues appear before the first header.
    MissingHeader {
        /// Path of the databank.
        path: String,
        /// One-based line number.
        line: usize,
    },
}

/// One record of a FASTA file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// First word of the header line.
    pub id: String,
    /// Residues with line breaks removed.
    pub residues: Vec<u8>,
}

impl Sequence {
    /// Number of residues.
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Whether the record has no residue.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// Reads every record of the FASTA file at `path`. Blank lines are ignored.
pub fn read_fasta(path: &Path) -> Result<Vec<Sequence>, FastaError> {
    let content = fs::read_to_string(path).map_err(|source| FastaError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_fasta(&content).map_err(|line| FastaError::MissingHeader {
        path: path.display().to_string(),
        line,
    })
}

/// Parses FASTA text. On failure, returns the 1-based line of the first
/// residue line found before any header.
fn parse_fasta(content: &str) -> Result<Vec<Sequence>, usize> {
    let mut sequences: Vec<Sequence> = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            let id = header.split_whitespace().next().unwrap_or_default();
            sequences.push(Sequence {
                id: id.to_string(),
                residues: Vec::new(),
            });
        } else {
            match sequences.last_mut() {
                Some(current) => current.residues.extend_from_slice(line.as_bytes()),
                None => return Err(number + 1),
            }
        }
    }
    Ok(sequences)
}
