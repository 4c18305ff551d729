//! # Property Tree
//!
//! An ordered, hierarchical key/value store. The same structure is used as the
//! sink for parsed command-line options, as the configuration store of a tool,
//! and as the model of the execution report.
//!
//! ## Insertion order is priority
//!
//! Keys are **not** unique. Every `add` appends, and a point lookup (`get`,
//! `get_str`, `get_int`) always resolves to the *earliest inserted* entry with
//! that key, searching sub-trees depth-first in insertion order. Later entries
//! with the same key stay visible to traversal (and therefore to the exporters)
//! but are shadowed for lookups.
//!
//! Layering is expressed only through the order in which trees are merged:
//!
//! ```text
//! input.merge(cli, 1);      // looked up first
//! input.merge(config, 1);   // only seen for keys the CLI did not set
//! ```
//!
//! Do not "fix" this into key-unique replacement semantics: CLI overrides,
//! configuration defaults and cross-stage piping all rely on it.
//!
//! `depth` is a presentation level used by the exporters. It never takes part
//! in lookup or override resolution.

use std::fmt;
use std::io;
use thiserror::Error;

/// Errors raised by the typed accessors of a [`PropertyTree`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// No entry has this key.
    #[error("Property '{key}' was not found.")]
    NotFound {
        /// The key looked up.
        key: String,
    },
    /// The value could not be read as an integer.
    #[error("Property '{key}' has value '{value}', which is not a valid integer.")]
    MalformedValue {
        /// The key looked up.
        key: String,
        /// The text found under it.
        value: String,
    },
    /// The first entry with this key is a named sub-tree.
    #[error("Property '{key}' is a sub-tree, not a value.")]
    NotAValue {
        /// The key looked up.
        key: String,
    },
}

/// One entry of a [`PropertyTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// A plain `key = value` entry.
    Leaf {
        /// Presentation level, relative to the enclosing tree.
        depth: usize,
        /// Lookup key. Need not be unique.
        key: String,
        /// Text value; flags are stored with an empty value.
        value: String,
    },
    /// A nested tree owned by this entry. Named sub-trees are rendered as a
    /// section; anonymous ones (`key == None`) are merge layers and are
    /// transparent to the exporters.
    Tree {
        /// Presentation level, relative to the enclosing tree.
        depth: usize,
        /// Section name, `None` for a merge layer.
        key: Option<String>,
        /// The nested entries.
        tree: PropertyTree,
    },
}

impl Property {
    /// Depth relative to the enclosing tree.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { depth, .. } | Self::Tree { depth, .. } => *depth,
        }
    }

    /// The key, `None` for a merge layer.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Leaf { key, .. } => Some(key),
            Self::Tree { key, .. } => key.as_deref(),
        }
    }

    /// The value of a leaf, `None` for a sub-tree.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Leaf { value, .. } => Some(value),
            Self::Tree { .. } => None,
        }
    }

    /// The nested tree of a sub-tree entry, `None` for a leaf.
    pub fn tree(&self) -> Option<&PropertyTree> {
        match self {
            Self::Leaf { .. } => None,
            Self::Tree { tree, .. } => Some(tree),
        }
    }
}

/// A traversal consumer for [`PropertyTree::accept`].
///
/// The tree calls the visitor once per entry, in insertion order, descending
/// into sub-trees as it meets them. Depths passed to the visitor are absolute:
/// an entry's own depth plus the absolute depth of the sub-tree holding it.
pub trait PropertyVisitor {
    /// Called once before the first entry.
    fn visit_begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Called for every leaf.
    fn visit_leaf(&mut self, depth: usize, key: &str, value: &str) -> io::Result<()>;

    /// Called before the entries of a sub-tree.
    fn visit_tree_begin(&mut self, _depth: usize, _key: Option<&str>) -> io::Result<()> {
        Ok(())
    }

    /// Called after the entries of a sub-tree.
    fn visit_tree_end(&mut self, _depth: usize, _key: Option<&str>) -> io::Result<()> {
        Ok(())
    }

    /// Called once after the last entry.
    fn visit_end(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Ordered sequence of [`Property`] entries. See the module documentation for
/// the lookup rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTree {
    entries: Vec<Property>,
}

impl PropertyTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tree has no entry at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of top-level entries (sub-trees count as one).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Top-level entries in insertion order.
    pub fn entries(&self) -> &[Property] {
        &self.entries
    }

    /// Appends a leaf. Duplicate keys are legal and are shadowed by the
    /// earlier entry on lookup.
    pub fn add(
        &mut self,
        depth: usize,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.entries.push(Property::Leaf {
            depth,
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a leaf whose value is built from format arguments, e.g.
    /// `tree.add_fmt(1, "ratio", format_args!("{:.2}", r))`.
    pub fn add_fmt(
        &mut self,
        depth: usize,
        key: impl Into<String>,
        value: fmt::Arguments<'_>,
    ) -> &mut Self {
        self.add(depth, key, value.to_string())
    }

    /// Appends `tree` as a named section. The tree is moved in, so it can only
    /// ever be attached once.
    pub fn add_tree(
        &mut self,
        depth: usize,
        key: impl Into<String>,
        tree: PropertyTree,
    ) -> &mut Self {
        self.entries.push(Property::Tree {
            depth,
            key: Some(key.into()),
            tree,
        });
        self
    }

    /// Appends `other` as an anonymous layer at `depth`.
    ///
    /// Everything already in `self` keeps priority over `other` for lookups;
    /// merging is how callers choose precedence.
    pub fn merge(&mut self, other: PropertyTree, depth: usize) -> &mut Self {
        self.entries.push(Property::Tree {
            depth,
            key: None,
            tree: other,
        });
        self
    }

    /// Returns the first entry whose key matches, searching depth-first in
    /// insertion order. A named sub-tree is matched before its own content.
    pub fn get(&self, key: &str) -> Option<&Property> {
        for entry in &self.entries {
            if entry.key() == Some(key) {
                return Some(entry);
            }
            if let Property::Tree { tree, .. } = entry
                && let Some(found) = tree.get(key)
            {
                return Some(found);
            }
        }
        None
    }

    /// Whether any entry, leaf or section, has this key.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The value of the first entry named `key`.
    pub fn get_str(&self, key: &str) -> Result<&str, PropertyError> {
        match self.get(key) {
            Some(Property::Leaf { value, .. }) => Ok(value),
            Some(Property::Tree { .. }) => Err(PropertyError::NotAValue {
                key: key.to_string(),
            }),
            None => Err(PropertyError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    /// The value of the first entry named `key`, parsed as an integer.
    pub fn get_int(&self, key: &str) -> Result<i64, PropertyError> {
        let value = self.get_str(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| PropertyError::MalformedValue {
                key: key.to_string(),
                value: value.to_string(),
            })
    }

    /// Overwrites the value of the first leaf named `key` in place, or appends
    /// a new leaf at depth 1 when there is none.
    ///
    /// Fails with [`PropertyError::NotAValue`] when the first entry named `key`
    /// is a section: a leaf appended behind it could never be looked up.
    pub fn set_str(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<&mut Self, PropertyError> {
        if matches!(self.get(key), Some(Property::Tree { .. })) {
            return Err(PropertyError::NotAValue {
                key: key.to_string(),
            });
        }
        let value = value.into();
        match self.first_leaf_value_mut(key) {
            Some(slot) => *slot = value,
            None => {
                self.add(1, key, value);
            }
        }
        Ok(self)
    }

    /// [`PropertyTree::set_str`] with an integer value.
    pub fn set_int(&mut self, key: &str, value: i64) -> Result<&mut Self, PropertyError> {
        self.set_str(key, value.to_string())
    }

    /// Depth-first traversal of every entry, see [`PropertyVisitor`].
    pub fn accept<V: PropertyVisitor + ?Sized>(&self, visitor: &mut V) -> io::Result<()> {
        visitor.visit_begin()?;
        self.walk(0, visitor)?;
        visitor.visit_end()
    }

    fn walk<V: PropertyVisitor + ?Sized>(&self, offset: usize, visitor: &mut V) -> io::Result<()> {
        for entry in &self.entries {
            match entry {
                Property::Leaf { depth, key, value } => {
                    visitor.visit_leaf(offset + depth, key, value)?;
                }
                Property::Tree { depth, key, tree } => {
                    let absolute = offset + depth;
                    visitor.visit_tree_begin(absolute, key.as_deref())?;
                    tree.walk(absolute, visitor)?;
                    visitor.visit_tree_end(absolute, key.as_deref())?;
                }
            }
        }
        Ok(())
    }

    /// Mutable access to the value of the entry `get` would return, if that
    /// entry is a leaf. A named sub-tree matching first blocks the search, so
    /// that `set_*` never writes to an entry `get` cannot see.
    fn first_leaf_value_mut(&mut self, key: &str) -> Option<&mut String> {
        self.locate(key).and_then(|path| self.leaf_at_mut(&path))
    }

    fn locate(&self, key: &str) -> Option<Vec<usize>> {
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.key() == Some(key) {
                return Some(vec![idx]);
            }
            if let Property::Tree { tree, .. } = entry
                && let Some(mut path) = tree.locate(key)
            {
                path.insert(0, idx);
                return Some(path);
            }
        }
        None
    }

    fn leaf_at_mut(&mut self, path: &[usize]) -> Option<&mut String> {
        let (first, rest) = path.split_first()?;
        match self.entries.get_mut(*first)? {
            Property::Leaf { value, .. } if rest.is_empty() => Some(value),
            Property::Tree { tree, .. } if !rest.is_empty() => tree.leaf_at_mut(rest),
            _ => None,
        }
    }
}

// MARK: --- UNIT TESTS ---
