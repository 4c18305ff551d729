//! # Property Exporters
//!
//! Two [`PropertyVisitor`] implementations that render a [`PropertyTree`]:
//!
//! - [`RawDumpVisitor`]: an indented, human-readable listing written to any
//!   `io::Write` sink (standard output by default).
//! - [`XmlDumpVisitor`]: a nested XML document written to a file, with an
//!   append mode that adds records to an existing document.
//!
//! Both keep their state in the visitor instance; the tree is only read.

use crate::constants::{INDENT, XML_ROOT_ELEMENT};
use crate::core::property::{PropertyTree, PropertyVisitor};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref INVALID_NAME_CHARS_RE: Regex = Regex::new(r"[^A-Za-z0-9_.\-]").unwrap();
}

#[derive(Error, Debug)]
pub enum ReportError {
    /// The report could not be written.
    #[error("Could not write report to '{path}': {source}")]
    Write {
        /// Target file, or `<stream>` for the readable report.
        path: String,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
}

/// Writes `tree` as an indented listing to `out`.
pub fn dump_readable<W: Write>(tree: &PropertyTree, out: W) -> Result<(), ReportError> {
    let mut visitor = RawDumpVisitor::new(out);
    tree.accept(&mut visitor).map_err(|source| ReportError::Write {
        path: "<stream>".to_string(),
        source,
    })
}

/// Writes `tree` as one record named `record` into the XML document at `path`.
pub fn dump_xml(
    tree: &PropertyTree,
    path: &Path,
    record: &str,
    append: bool,
) -> Result<(), ReportError> {
    let mut visitor = XmlDumpVisitor::new(path, record, append);
    tree.accept(&mut visitor).map_err(|source| ReportError::Write {
        path: path.display().to_string(),
        source,
    })
}

// --- Readable export ---

/// Indented plain-text export: `key : value` per leaf, a `[key]` header per
/// named sub-tree. Anonymous merge layers add no header.
#[derive(Debug)]
pub struct RawDumpVisitor<W: Write> {
    out: W,
}

impl<W: Write> RawDumpVisitor<W> {
    /// A visitor writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> PropertyVisitor for RawDumpVisitor<W> {
    fn visit_leaf(&mut self, depth: usize, key: &str, value: &str) -> io::Result<()> {
        writeln!(self.out, "{}{} : {}", INDENT.repeat(depth), key, value)
    }

    fn visit_tree_begin(&mut self, depth: usize, key: Option<&str>) -> io::Result<()> {
        match key {
            Some(key) => writeln!(self.out, "{}[{}]", INDENT.repeat(depth), key),
            None => Ok(()),
        }
    }

    fn visit_end(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

// --- Structured export ---

/// XML export of one record. The record is rendered in memory during the
/// traversal and written to disk by `visit_end`.
///
/// Element nesting mirrors the tree: a named sub-tree becomes an element
/// holding its entries, and a leaf directly followed by deeper entries is
/// opened as an element holding them, until the depth drops back to its own.
/// Anonymous merge layers are transparent.
///
/// In append mode the record is inserted before the closing root tag of the
/// existing document; a missing or unrecognised file starts a new document.
#[derive(Debug)]
pub struct XmlDumpVisitor {
    path: PathBuf,
    record: String,
    append: bool,
    body: String,
    /// Elements currently open, innermost last.
    open: Vec<OpenElement>,
    /// Last leaf seen; whether it holds children is known at the next entry.
    pending: Option<PendingLeaf>,
}

#[derive(Debug)]
enum OpenElement {
    /// A named sub-tree, closed by `visit_tree_end`.
    Section(String),
    /// A leaf followed by deeper entries, closed when depth drops to `depth`.
    Leaf { depth: usize, name: String },
}

#[derive(Debug)]
struct PendingLeaf {
    depth: usize,
    key: String,
    value: String,
}

impl XmlDumpVisitor {
    /// A visitor writing one record named `record` to `path`.
    pub fn new(path: impl Into<PathBuf>, record: &str, append: bool) -> Self {
        Self {
            path: path.into(),
            record: element_name(record),
            append,
            body: String::new(),
            open: Vec::new(),
            pending: None,
        }
    }

    /// Writes `text` indented below the record and every open element.
    fn line(&mut self, text: &str) {
        let level = 2 + self.open.len();
        // Writing into a String cannot fail.
        let _ = writeln!(self.body, "{}{}", INDENT.repeat(level), text);
    }

    fn close_top(&mut self) {
        if let Some(element) = self.open.pop() {
            let name = match element {
                OpenElement::Section(name) | OpenElement::Leaf { name, .. } => name,
            };
            self.line(&format!("</{}>", name));
        }
    }

    /// Resolves the pending leaf now that the next entry is at `depth`, then
    /// closes the leaf elements that entry is not nested in.
    fn settle(&mut self, depth: usize) {
        if let Some(leaf) = self.pending.take() {
            let name = element_name(&leaf.key);
            if depth > leaf.depth {
                self.line(&format!("<{}>", name));
                self.open.push(OpenElement::Leaf {
                    depth: leaf.depth,
                    name,
                });
                if !leaf.value.is_empty() {
                    self.line(&escape(&leaf.value));
                }
                return;
            }
            let text = if leaf.value.is_empty() {
                format!("<{}/>", name)
            } else {
                format!("<{name}>{}</{name}>", escape(&leaf.value))
            };
            self.line(&text);
        }
        while matches!(self.open.last(), Some(OpenElement::Leaf { depth: open, .. }) if *open >= depth)
        {
            self.close_top();
        }
    }

    fn document(&self) -> io::Result<String> {
        if self.append {
            match fs::read_to_string(&self.path) {
                Ok(existing) => {
                    let closing = format!("</{}>", XML_ROOT_ELEMENT);
                    if let Some(pos) = existing.rfind(&closing) {
                        let (head, tail) = existing.split_at(pos);
                        return Ok(format!("{}{}{}", head, self.body, tail));
                    }
                    log::warn!(
                        "'{}' is not a stats document, starting a new one.",
                        self.path.display()
                    );
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<{root}>\n{body}</{root}>\n",
            root = XML_ROOT_ELEMENT,
            body = self.body
        ))
    }
}

impl PropertyVisitor for XmlDumpVisitor {
    fn visit_begin(&mut self) -> io::Result<()> {
        self.body.clear();
        self.open.clear();
        self.pending = None;
        let _ = writeln!(self.body, "{}<{}>", INDENT, self.record);
        Ok(())
    }

    fn visit_leaf(&mut self, depth: usize, key: &str, value: &str) -> io::Result<()> {
        self.settle(depth);
        self.pending = Some(PendingLeaf {
            depth,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn visit_tree_begin(&mut self, depth: usize, key: Option<&str>) -> io::Result<()> {
        if let Some(key) = key {
            self.settle(depth);
            let name = element_name(key);
            self.line(&format!("<{}>", name));
            self.open.push(OpenElement::Section(name));
        }
        Ok(())
    }

    fn visit_tree_end(&mut self, depth: usize, key: Option<&str>) -> io::Result<()> {
        if key.is_some() {
            self.settle(depth);
            // Leaf elements were closed by `settle`; the section is on top.
            self.close_top();
        }
        Ok(())
    }

    fn visit_end(&mut self) -> io::Result<()> {
        self.settle(0);
        while !self.open.is_empty() {
            self.close_top();
        }
        let _ = writeln!(self.body, "{}</{}>", INDENT, self.record);

        let document = self.document()?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        log::debug!(
            "Writing stats record '{}' to {} (append: {})",
            self.record,
            self.path.display(),
            self.append
        );
        fs::write(&self.path, document)
    }
}

/// Turns an arbitrary property key into a valid XML element name.
fn element_name(key: &str) -> String {
    let cleaned = INVALID_NAME_CHARS_RE.replace_all(key, "_");
    match cleaned.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => cleaned.into_owned(),
        _ => format!("_{}", cleaned),
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// MARK: --- UNIT TESTS ---
