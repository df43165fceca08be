//! Tag descriptors and item addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Describes one named slot of an item: its arity bounds and which child
/// model types it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInfo {
    name: String,
    min: usize,
    /// `None` means unbounded.
    max: Option<usize>,
    /// Empty means any model type is accepted.
    model_types: Vec<String>,
}

impl TagInfo {
    /// Creates a tag descriptor.
    pub fn new<I, S>(name: impl Into<String>, min: usize, max: Option<usize>, model_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            min,
            max,
            model_types: model_types.into_iter().map(Into::into).collect(),
        }
    }

    /// A tag accepting any number of children of any type.
    pub fn universal(name: impl Into<String>) -> Self {
        Self::new(name, 0, None, Vec::<String>::new())
    }

    /// A tag accepting any number of children of the given types.
    pub fn universal_of<I, S>(name: impl Into<String>, model_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, 0, None, model_types)
    }

    /// A tag holding exactly one child of the given type.
    pub fn property_tag(name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self::new(name, 1, Some(1), [model_type.into()])
    }

    /// The tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minimum number of children.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Maximum number of children, `None` when unbounded.
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Accepted model types; empty means any.
    pub fn model_types(&self) -> &[String] {
        &self.model_types
    }

    /// Returns `true` if a child of `model_type` may be stored under this tag.
    pub fn is_valid_child(&self, model_type: &str) -> bool {
        self.model_types.is_empty() || self.model_types.iter().any(|t| t == model_type)
    }

    /// Returns `true` if the tag holds exactly one item.
    pub fn is_single_property_tag(&self) -> bool {
        self.min == 1 && self.max == Some(1)
    }

    /// Returns `true` if `count` children would exceed the maximum.
    pub fn exceeds_max(&self, count: usize) -> bool {
        self.max.is_some_and(|max| count > max)
    }

    /// The maximum as a number, `usize::MAX` when unbounded.
    pub(crate) fn max_or_unbounded(&self) -> usize {
        self.max.unwrap_or(usize::MAX)
    }
}

/// Position of a child within its parent: tag name and row within that tag.
///
/// An empty tag name refers to the parent's default tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagRow {
    /// The tag name, or empty for the default tag.
    pub tag: String,
    /// The row within the tag.
    pub row: usize,
}

impl TagRow {
    /// Creates a tag/row pair.
    pub fn new(tag: impl Into<String>, row: usize) -> Self {
        Self {
            tag: tag.into(),
            row,
        }
    }

    /// Row `row` in the parent's default tag.
    pub fn default_tag(row: usize) -> Self {
        Self::new("", row)
    }

    /// Same tag, next row.
    pub fn next(&self) -> Self {
        Self::new(self.tag.clone(), self.row + 1)
    }
}

impl fmt::Display for TagRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.tag, self.row)
    }
}

/// Address of an item relative to the model root: one [`TagRow`] per level.
///
/// Paths stay meaningful after the item they addressed is destroyed and
/// re-created, which is what the undo stack relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ItemPath(Vec<TagRow>);

impl ItemPath {
    /// The path of the root item.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Creates a path from its levels.
    pub fn from_levels(levels: Vec<TagRow>) -> Self {
        Self(levels)
    }

    /// Appends one level.
    pub fn push(&mut self, tag_row: TagRow) {
        self.0.push(tag_row);
    }

    /// Returns the path extended by one level.
    pub fn join(&self, tag_row: TagRow) -> Self {
        let mut path = self.clone();
        path.push(tag_row);
        path
    }

    /// Splits off the last level, yielding the parent path.
    pub fn split_last(&self) -> Option<(ItemPath, &TagRow)> {
        self.0
            .split_last()
            .map(|(last, parent)| (ItemPath(parent.to_vec()), last))
    }

    /// The levels of this path.
    pub fn levels(&self) -> &[TagRow] {
        &self.0
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for level in &self.0 {
            write!(f, "/{level}")?;
        }
        Ok(())
    }
}
